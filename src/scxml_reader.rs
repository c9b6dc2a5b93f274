//! Implements a SAX-style parser for SCXML documents according to the W3C recommendation.
//! See [W3C:SCXML Overview](/doc/W3C_SCXML_2024_07_13/index.html#overview).
//!
//! Convenience reader that builds a [Fsm] from a document string or file. Document parsing
//! sits outside the interpreter's core contract; [crate::fsm_executor::FsmExecutor] uses it
//! to load the state machines it starts.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::{mem, str};

#[cfg(feature = "Debug_Reader")]
#[cfg(test)]
use std::println as debug;
#[cfg(feature = "Debug_Reader")]
#[cfg(not(test))]
use log::debug;

use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::datamodel::Data;
use crate::executable_content::{
    get_opt_executable_content_as, get_safe_executable_content_as, parse_duration_to_milliseconds,
    Assign, ExecutableContent, Expression, ForEach, If, Log, Raise, SendParameters,
};
use crate::fsm::{
    map_history_type, map_transition_type, push_param, BindingType, Cancel, CommonContent,
    DoneData, ExecutableContentId, Fsm, HistoryType, Invoke, Parameter, State, StateId,
    Transition, TransitionId, TransitionType, ID_COUNTER,
};

pub type AttributeMap = std::collections::HashMap<String, String>;
pub type XReader<'a> = Reader<&'a [u8]>;

static DOC_ID_COUNTER: AtomicU32 = AtomicU32::new(1);

pub const TAG_SCXML: &str = "scxml";
pub const ATTR_NAME: &str = "name";
pub const ATTR_BINDING: &str = "binding";
pub const ATTR_DATAMODEL: &str = "datamodel";

pub const TAG_DATAMODEL: &str = "datamodel";
pub const TAG_DATA: &str = "data";
pub const TAG_VERSION: &str = "version";
pub const TAG_INITIAL: &str = "initial";
pub const ATTR_ID: &str = "id";

pub const TAG_STATE: &str = "state";
pub const ATTR_INITIAL: &str = "initial";
pub const TAG_HISTORY: &str = "history";
pub const TAG_PARALLEL: &str = "parallel";
pub const TAG_FINAL: &str = "final";
pub const TAG_TRANSITION: &str = "transition";
pub const ATTR_COND: &str = "cond";
pub const TAG_EVENT: &str = "event";
pub const TAG_TYPE: &str = "type";
pub const TAG_ON_ENTRY: &str = "onentry";
pub const TAG_ON_EXIT: &str = "onexit";
pub const TAG_INVOKE: &str = "invoke";
pub const ATTR_SRCEXPR: &str = "srcexpr";
pub const ATTR_AUTOFORWARD: &str = "autoforward";

pub const TAG_FINALIZE: &str = "finalize";
pub const TAG_DONEDATA: &str = "donedata";

pub const TAG_INCLUDE: &str = "include";
pub const TAG_HREF: &str = "href";
pub const ATTR_PARSE: &str = "parse";
pub const ATTR_XPOINTER: &str = "xpointer";

pub const TAG_RAISE: &str = "raise";
pub const TAG_SEND: &str = "send";
pub const ATTR_EVENT: &str = "event";
pub const ATTR_EVENTEXPR: &str = "eventexpr";
pub const ATTR_TARGET: &str = "target";
pub const ATTR_TARGETEXPR: &str = "targetexpr";
pub const TARGET_INTERNAL: &str = "_internal";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_TYPEEXPR: &str = "typeexpr";
pub const ATTR_IDLOCATION: &str = "idlocation";
pub const ATTR_DELAY: &str = "delay";
pub const ATTR_DELAYEXPR: &str = "delayexpr";
pub const ATTR_NAMELIST: &str = "namelist";
pub const TAG_PARAM: &str = "param";
pub const TAG_CONTENT: &str = "content";

pub const TAG_LOG: &str = "log";
pub const TAG_SCRIPT: &str = "script";
pub const ATTR_SRC: &str = "src";
pub const TAG_ASSIGN: &str = "assign";
pub const ATTR_LOCATION: &str = "location";

pub const TAG_IF: &str = "if";
pub const TAG_FOR_EACH: &str = "foreach";
pub const ATTR_ARRAY: &str = "array";
pub const ATTR_ITEM: &str = "item";
pub const ATTR_INDEX: &str = "index";

pub const TAG_CANCEL: &str = "cancel";
pub const ATTR_SENDIDEXPR: &str = "sendidexpr";
pub const ATTR_SENDID: &str = "sendid";

pub const TAG_ELSE: &str = "else";
pub const TAG_ELSEIF: &str = "elseif";

pub const ATTR_LABEL: &str = "label";
pub const ATTR_EXPR: &str = "expr";

struct ReaderStackItem {
    current_state: StateId,
    current_transition: TransitionId,
    current_tag: String,
}

impl ReaderStackItem {
    fn new(o: &ReaderStackItem) -> ReaderStackItem {
        ReaderStackItem {
            current_state: o.current_state,
            current_transition: o.current_transition,
            current_tag: o.current_tag.clone(),
        }
    }
}

struct ReaderState {
    in_scxml: bool,
    id_count: i32,
    file: PathBuf,
    content: String,
    fsm: Box<Fsm>,
    current: ReaderStackItem,
    stack: Vec<ReaderStackItem>,
    executable_content_stack: Vec<(ExecutableContentId, &'static str)>,
    current_executable_content: ExecutableContentId,
    include_paths: Vec<PathBuf>,
}

impl ReaderState {
    fn new() -> ReaderState {
        ReaderState {
            in_scxml: false,
            id_count: 0,
            stack: vec![],
            executable_content_stack: vec![],
            current_executable_content: 0,
            current: ReaderStackItem {
                current_state: 0,
                current_transition: 0,
                current_tag: "".to_string(),
            },
            fsm: Box::new(Fsm::new()),
            file: Path::new("Buffer").to_path_buf(),
            content: "".to_string(),
            include_paths: Vec::new(),
        }
    }

    /// Process a XML file. The file is read into a buffer first so the individual
    /// start/end handlers can slice text content directly out of it by byte offset.
    fn process_file(&mut self, file: &Path) -> Result<&str, String> {
        self.file.clone_from(&file.to_path_buf());
        match File::open(self.file.clone()) {
            Ok(mut f) => {
                self.content.clear();
                match f.read_to_string(&mut self.content) {
                    Ok(_len) => self.process(),
                    Err(e) => Err(format!("Failed to read {:?}. {}", self.file, e)),
                }
            }
            Err(e) => Err(format!("Failed to open {:?}. {}", self.file, e)),
        }
    }

    fn process(&mut self) -> Result<&str, String> {
        #[cfg(feature = "Debug_Reader")]
        debug!(">>> Reading {:?}", self.file);

        let ct = self.content.clone();
        let mut reader = Reader::from_str(ct.as_str());
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Err(e) => {
                    return Err(format!(
                        "Error at position {}: {:?}",
                        reader.buffer_position(),
                        e
                    ));
                }
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    self.start_element(&mut reader, &e, true);
                }
                Ok(Event::End(e)) => {
                    self.end_element(str::from_utf8(e.local_name().as_ref()).unwrap());
                }
                Ok(Event::Empty(e)) => {
                    self.start_element(&mut reader, &e, false);
                    self.end_element(str::from_utf8(e.local_name().as_ref()).unwrap());
                }
                Ok(Event::Text(_e)) => {}
                Ok(_e) => {
                    #[cfg(feature = "Debug_Reader")]
                    debug!("Ignored SAX Event {:?}", _e)
                }
            }
        }
        #[cfg(feature = "Debug_Reader")]
        debug!("<<< {:?}", self.file);
        Ok("ok")
    }

    fn push(&mut self, tag: &str) {
        self.stack.push(ReaderStackItem::new(&self.current));
        self.current.current_tag = tag.to_string();
    }

    fn pop(&mut self) {
        if let Some(p) = self.stack.pop() {
            self.current = p;
        }
    }

    fn generate_name(&mut self) -> String {
        self.id_count += 1;
        format!("__id{}", self.id_count)
    }

    fn parse_location_expressions(&mut self, location_expr: &str, targets: &mut Vec<String>) {
        location_expr.split_ascii_whitespace().for_each(|location| {
            targets.push(location.to_string());
        });
    }

    fn parse_state_specification(&mut self, target_name: &str, targets: &mut Vec<StateId>) {
        target_name
            .split_ascii_whitespace()
            .for_each(|target| targets.push(self.get_or_create_state(target, false)));
    }

    fn parse_boolean(&mut self, value: &Option<&String>, default: bool) -> bool {
        match value {
            Some(val) => val.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    fn get_state_by_id_mut(&mut self, id: StateId) -> &mut State {
        self.fsm.get_state_by_id_mut(id)
    }

    fn get_current_state(&mut self) -> &mut State {
        let id = self.current.current_state;
        if id == 0 {
            panic!("Internal error: Current State is unknown");
        }
        self.get_state_by_id_mut(id)
    }

    fn get_current_transition(&mut self) -> &mut Transition {
        let id = self.current.current_transition;
        if id == 0 {
            panic!("Internal error: Current Transition is unknown");
        }
        self.fsm.get_transition_by_id_mut(id)
    }

    /// Starts a new region of executable content. A stack is used to handle nested
    /// regions (e.g. the body of an `<if>` inside a `<transition>`).
    fn start_executable_content_region(&mut self, stack: bool, tag: &'static str) -> ExecutableContentId {
        if stack {
            self.executable_content_stack
                .push((self.current_executable_content, tag));
        } else {
            self.executable_content_stack.clear();
        }
        self.current_executable_content = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.fsm
            .executableContent
            .insert(self.current_executable_content, Vec::new());
        self.current_executable_content
    }

    fn get_last_executable_content_entry_for_region(
        &mut self,
        ec_id: ExecutableContentId,
    ) -> Option<&mut dyn ExecutableContent> {
        self.fsm
            .executableContent
            .get_mut(&ec_id)
            .map(|vc| vc.last_mut().unwrap().as_mut())
    }

    fn end_executable_content_region(&mut self, tag: &'static str) -> ExecutableContentId {
        if self.current_executable_content == 0 {
            panic!("Try to get executable content in unsupported document part.");
        }
        let ec_id = self.current_executable_content;
        match self.executable_content_stack.pop() {
            Some((oec_id, oec_tag)) => {
                self.current_executable_content = oec_id;
                if (!tag.is_empty()) && tag.ne(oec_tag) {
                    self.end_executable_content_region(tag);
                }
            }
            None => {
                self.current_executable_content = 0;
            }
        };
        if self.fsm.executableContent.contains_key(&ec_id) {
            ec_id
        } else {
            0
        }
    }

    fn add_executable_content(&mut self, ec: Box<dyn ExecutableContent>) {
        if self.current_executable_content == 0 {
            panic!("Try to add executable content to unsupported document part.");
        }
        self.fsm
            .executableContent
            .get_mut(&self.current_executable_content)
            .unwrap()
            .push(ec);
    }

    fn get_parent_tag(&self) -> &str {
        match self.stack.last() {
            Some(item) => item.current_tag.as_str(),
            None => "",
        }
    }

    fn verify_parent_tag(&self, name: &str, allowed_parents: &[&str]) -> &str {
        let parent_tag = self.get_parent_tag();
        if !allowed_parents.contains(&parent_tag) {
            let mut allowed = String::new();
            for (i, ai) in allowed_parents.iter().enumerate() {
                if i > 0 {
                    allowed.push_str(if i < allowed_parents.len() - 1 { ", " } else { " or " });
                }
                allowed.push_str(&format!("<{}>", ai));
            }
            panic!("<{}> inside <{}>. Only allowed inside {}", name, parent_tag, allowed);
        }
        parent_tag
    }

    fn get_or_create_state(&mut self, name: &str, parallel: bool) -> StateId {
        match self.fsm.statesNames.get(name).cloned() {
            None => {
                let mut s = State::new(&name.to_string());
                s.id = (self.fsm.states.len() + 1) as StateId;
                s.is_parallel = parallel;
                let sid = s.id;
                self.fsm.statesNames.insert(s.name.clone(), s.id);
                self.fsm.states.push(s);
                sid
            }
            Some(id) => {
                if parallel {
                    self.fsm.states.get_mut((id - 1) as usize).unwrap().is_parallel = true;
                }
                id
            }
        }
    }

    fn get_or_create_state_with_attributes(
        &mut self,
        attr: &AttributeMap,
        parallel: bool,
        parent: StateId,
    ) -> StateId {
        let sname = match attr.get(ATTR_ID) {
            None => self.generate_name(),
            Some(id) => id.clone(),
        };
        let id = self.get_or_create_state(&sname, parallel);

        let initial = match attr.get(ATTR_INITIAL) {
            None => 0,
            Some(id_refs) => {
                let mut t = Transition::new();
                t.doc_id = DOC_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
                t.transition_type = TransitionType::Internal;
                t.source = id;
                let tid = t.id;
                self.parse_state_specification(id_refs, &mut t.target);
                self.fsm.transitions.insert(t.id, t);
                tid
            }
        };

        let state = self.get_state_by_id_mut(id);
        if initial != 0 {
            state.initial = initial;
        }
        state.doc_id = DOC_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        if parent != 0 {
            state.parent = parent;
            let parent_state = self.get_state_by_id_mut(parent);
            if !parent_state.states.contains(&id) {
                parent_state.states.push(id);
            }
        }

        id
    }

    fn get_required_attr<'a>(tag: &str, attribute: &str, attr: &'a AttributeMap) -> &'a String {
        match attr.get(attribute) {
            Some(v) => v,
            None => panic!("<{}> requires attribute {}", tag, attribute),
        }
    }

    /// Reads a file referenced by a relative path, resolved against the current
    /// document's directory or one of the configured include paths.
    fn read_from_relative_path(&mut self, path: &str) -> Result<String, String> {
        let file_src = self.get_resolved_path(path)?;
        self.file.clone_from(&file_src);
        match File::open(file_src.clone()) {
            Ok(mut file) => {
                let mut buf = String::with_capacity(file.metadata().map(|m| m.len()).unwrap_or(0) as usize);
                match file.read_to_string(&mut buf) {
                    Ok(_r) => Ok(buf),
                    Err(e) => Err(e.to_string()),
                }
            }
            Err(e) => Err(format!("Failed to load relative path {:?}: {}", file_src, e)),
        }
    }

    fn start_parallel(&mut self, attr: &AttributeMap) -> StateId {
        self.verify_parent_tag(TAG_PARALLEL, &[TAG_SCXML, TAG_STATE, TAG_PARALLEL]);
        let state_id = self.get_or_create_state_with_attributes(attr, true, self.current.current_state);
        self.current.current_state = state_id;
        state_id
    }

    fn start_final(&mut self, attr: &AttributeMap) -> StateId {
        self.verify_parent_tag(TAG_FINAL, &[TAG_SCXML, TAG_STATE]);
        let state_id = self.get_or_create_state_with_attributes(attr, false, self.current.current_state);
        self.fsm.get_state_by_id_mut(state_id).is_final = true;
        self.current.current_state = state_id;
        state_id
    }

    fn start_donedata(&mut self) {
        self.verify_parent_tag(TAG_DONEDATA, &[TAG_FINAL]);
        self.get_current_state().donedata = Some(DoneData::new());
    }

    fn start_history(&mut self, attr: &AttributeMap) -> StateId {
        self.verify_parent_tag(TAG_HISTORY, &[TAG_STATE, TAG_PARALLEL]);
        // Don't add history pseudo-states to the parent's child list.
        let state_id = self.get_or_create_state_with_attributes(attr, false, 0);
        if self.current.current_state > 0 {
            let parent_state = self.get_current_state();
            parent_state.history.push(state_id);
        }
        let hstate = self.fsm.get_state_by_id_mut(state_id);
        hstate.parent = self.current.current_state;

        match attr.get(TAG_TYPE) {
            None => hstate.history_type = HistoryType::Shallow,
            Some(type_name) => hstate.history_type = map_history_type(type_name),
        }
        self.current.current_state = state_id;
        state_id
    }

    fn start_state(&mut self, attr: &AttributeMap) -> StateId {
        self.verify_parent_tag(TAG_STATE, &[TAG_SCXML, TAG_STATE, TAG_PARALLEL]);
        let sid = self.get_or_create_state_with_attributes(attr, false, self.current.current_state);
        self.current.current_state = sid;
        sid
    }

    fn start_datamodel(&mut self) {
        self.verify_parent_tag(TAG_DATAMODEL, &[TAG_SCXML, TAG_STATE, TAG_PARALLEL]);
    }

    fn start_data(&mut self, attr: &AttributeMap, reader: &mut XReader, has_content: bool) {
        self.verify_parent_tag(TAG_DATA, &[TAG_DATAMODEL]);

        let id = Self::get_required_attr(TAG_DATA, ATTR_ID, attr).clone();
        let src = attr.get(ATTR_SRC);
        let expr = attr.get(ATTR_EXPR);

        let content = if has_content {
            self.read_content(TAG_DATA, reader)
        } else {
            String::new()
        };

        // W3C: 'src', 'expr' and children are mutually exclusive in <data>.
        if let Some(src_val) = src {
            if !(expr.is_none() && content.is_empty()) {
                panic!(
                    "{} shall have only {}, {} or children, but not some combination of it.",
                    TAG_DATA, ATTR_SRC, ATTR_EXPR
                );
            }
            match self.read_from_relative_path(src_val.as_str()) {
                Ok(source) => {
                    self.get_current_state().data.set(&id, Data::String(source));
                }
                Err(e) => panic!("Can't read data source '{}'. {}", src_val, e),
            }
        } else if let Some(expr_val) = expr {
            if !content.is_empty() {
                panic!(
                    "{} shall have only {}, {} or children, but not some combination of it.",
                    TAG_DATA, ATTR_SRC, ATTR_EXPR
                );
            }
            self.get_current_state().data.set(&id, Data::String(expr_val.clone()));
        } else if !content.is_empty() {
            self.get_current_state().data.set(&id, Data::String(content));
        } else {
            self.get_current_state().data.set(&id, Data::Null());
        }
    }

    fn start_initial(&mut self) {
        self.verify_parent_tag(TAG_INITIAL, &[TAG_STATE, TAG_PARALLEL]);
        if self.get_current_state().initial > 0 {
            panic!(
                "<{}> must not be specified if {}-attribute was given",
                TAG_INITIAL, ATTR_INITIAL
            )
        }
    }

    fn start_invoke(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_INVOKE, &[TAG_STATE, TAG_PARALLEL]);
        let mut invoke = Invoke::new();

        if let Some(type_opt) = attr.get(ATTR_TYPE) {
            invoke.type_name.clone_from(type_opt);
        }
        if let Some(typeexpr) = attr.get(ATTR_TYPEEXPR) {
            invoke.type_expr.clone_from(typeexpr);
        }
        // W3C: must not occur with the 'srcexpr' attribute or the <content> element.
        if let Some(src) = attr.get(ATTR_SRC) {
            invoke.src.clone_from(src);
        }
        if let Some(srcexpr) = attr.get(ATTR_SRCEXPR) {
            invoke.src_expr.clone_from(srcexpr);
        }
        if let Some(id) = attr.get(ATTR_ID) {
            invoke.invoke_id.clone_from(id);
        }
        invoke.parent_state_name.clone_from(&self.get_current_state().name);

        if let Some(idlocation) = attr.get(ATTR_IDLOCATION) {
            invoke.external_id_location.clone_from(idlocation);
        }
        if let Some(name_list) = attr.get(ATTR_NAMELIST) {
            self.parse_location_expressions(name_list, &mut invoke.name_list);
        }
        invoke.autoforward = self.parse_boolean(&attr.get(ATTR_AUTOFORWARD), false);

        self.get_current_state().invoke.push(invoke);
    }

    fn start_finalize(&mut self, _attr: &AttributeMap) {
        self.verify_parent_tag(TAG_FINALIZE, &[TAG_INVOKE]);
        self.start_executable_content_region(false, TAG_FINALIZE);
    }

    fn end_finalize(&mut self) {
        let ec_id = self.end_executable_content_region(TAG_FINALIZE);
        self.get_current_state().invoke.last_mut().finalize = ec_id;
    }

    fn start_transition(&mut self, attr: &AttributeMap) {
        let parent_tag = self
            .verify_parent_tag(TAG_TRANSITION, &[TAG_HISTORY, TAG_INITIAL, TAG_STATE, TAG_PARALLEL])
            .to_string();

        let mut t = Transition::new();
        t.doc_id = DOC_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        self.start_executable_content_region(false, TAG_TRANSITION);

        if let Some(event) = attr.get(TAG_EVENT) {
            t.events = event
                .split_whitespace()
                .map(|s| {
                    let mut rt = s;
                    loop {
                        if let Some(r) = rt.strip_suffix(".*") {
                            rt = r;
                            continue;
                        }
                        if let Some(r) = rt.strip_suffix('.') {
                            rt = r;
                            continue;
                        }
                        break;
                    }
                    rt.to_string()
                })
                .collect();
            t.wildcard = t.events.contains(&"*".to_string());
        }

        if let Some(cond) = attr.get(ATTR_COND) {
            t.cond = Some(cond.clone());
        }

        if let Some(target_name) = attr.get(ATTR_TARGET) {
            self.parse_state_specification(target_name, &mut t.target);
        }

        if let Some(trans_type) = attr.get(TAG_TYPE) {
            t.transition_type = map_transition_type(trans_type);
        }

        let state = self.get_current_state();

        if parent_tag.eq(TAG_INITIAL) {
            if state.initial > 0 {
                panic!("<initial> must not be specified if initial-attribute was given")
            }
            state.initial = t.id;
        } else {
            state.transitions.push(t.id);
        }
        t.source = state.id;
        self.current.current_transition = t.id;
        self.fsm.transitions.insert(t.id, t);
    }

    fn end_transition(&mut self) {
        let ec_id = self.end_executable_content_region(TAG_TRANSITION);
        self.get_current_transition().content = ec_id;
    }

    fn start_script(&mut self, attr: &AttributeMap, reader: &mut XReader, has_content: bool) {
        self.verify_parent_tag(
            TAG_SCRIPT,
            &[TAG_SCXML, TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH, TAG_FINALIZE],
        );

        let mut s = Expression::new();

        if let Some(file_src) = attr.get(ATTR_SRC) {
            // W3C: if the script cannot be downloaded the document is non-conformant.
            match self.read_from_relative_path(file_src) {
                Ok(source) => s.content = source,
                Err(e) => panic!("Can't read script '{}'. {}", file_src, e),
            }
        }

        let script_text = if has_content {
            self.read_content(TAG_SCRIPT, reader)
        } else {
            String::new()
        };
        let src = script_text.trim();
        if !src.is_empty() {
            if !s.content.is_empty() {
                panic!("<script> with 'src' attribute shall not have content.")
            }
            s.content = src.to_string();
        }

        let is_global_script = self.get_parent_tag() == TAG_SCXML;
        self.add_executable_content(Box::new(s));
        if is_global_script {
            self.fsm.script = self.current_executable_content;
        }
    }

    fn start_for_each(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(
            TAG_FOR_EACH,
            &[TAG_ON_ENTRY, TAG_ON_EXIT, TAG_TRANSITION, TAG_FOR_EACH, TAG_IF, TAG_FINALIZE],
        );

        let ec_id = self.current_executable_content;
        let mut fe = ForEach::new();
        fe.array.clone_from(Self::get_required_attr(TAG_FOR_EACH, ATTR_ARRAY, attr));
        fe.item.clone_from(Self::get_required_attr(TAG_FOR_EACH, ATTR_ITEM, attr));
        if let Some(index) = attr.get(ATTR_INDEX) {
            fe.index.clone_from(index);
        }
        self.add_executable_content(Box::new(fe));
        let content_id = self.start_executable_content_region(true, TAG_FOR_EACH);

        let ec_opt = self.get_last_executable_content_entry_for_region(ec_id);
        match get_opt_executable_content_as::<ForEach>(ec_opt) {
            Some(fe) => fe.content = content_id,
            None => panic!(
                "Internal Error: Executable Content missing in start_for_each in region #{}",
                ec_id
            ),
        }
    }

    fn end_for_each(&mut self) {
        self.end_executable_content_region(TAG_FOR_EACH);
    }

    fn start_cancel(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_CANCEL, &[TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH]);

        let sendid = attr.get(ATTR_SENDID);
        let sendidexpr = attr.get(ATTR_SENDIDEXPR);

        let mut cancel = Cancel::new();
        if let Some(sendid_value) = sendid {
            if sendidexpr.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_CANCEL, ATTR_SENDID, ATTR_SENDIDEXPR);
            }
            cancel.send_id.clone_from(sendid_value);
        } else if let Some(sendidexpr_value) = sendidexpr {
            cancel.send_id_expr.clone_from(sendidexpr_value);
        } else {
            panic!("{}: attribute {} or {} must be given", TAG_CANCEL, ATTR_SENDID, ATTR_SENDIDEXPR);
        }
        self.add_executable_content(Box::new(cancel));
    }

    fn start_on_entry(&mut self, _attr: &AttributeMap) {
        self.verify_parent_tag(TAG_ON_ENTRY, &[TAG_STATE, TAG_PARALLEL, TAG_FINAL]);
        self.start_executable_content_region(false, TAG_ON_ENTRY);
    }

    fn end_on_entry(&mut self) {
        let ec_id = self.end_executable_content_region(TAG_ON_ENTRY);
        self.get_current_state().onentry = ec_id;
    }

    fn start_on_exit(&mut self, _attr: &AttributeMap) {
        self.verify_parent_tag(TAG_ON_EXIT, &[TAG_STATE, TAG_PARALLEL, TAG_FINAL]);
        self.start_executable_content_region(false, TAG_ON_EXIT);
    }

    fn end_on_exit(&mut self) {
        let ec_id = self.end_executable_content_region(TAG_ON_EXIT);
        self.get_current_state().onexit = ec_id;
    }

    fn start_if(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_IF, &[TAG_ON_ENTRY, TAG_ON_EXIT, TAG_TRANSITION, TAG_FOR_EACH, TAG_IF, TAG_FINALIZE]);

        let ec_if = If::new(Self::get_required_attr(TAG_IF, ATTR_COND, attr));
        self.add_executable_content(Box::new(ec_if));
        let if_id = self.current_executable_content;

        self.start_executable_content_region(true, TAG_IF);
        let if_cid = self.current_executable_content;

        let if_ec = self.get_last_executable_content_entry_for_region(if_id);
        match get_opt_executable_content_as::<If>(if_ec) {
            Some(evc_if) => evc_if.content = if_cid,
            None => panic!("Internal Error: Executable Content missing in start_if in region #{}", if_id),
        }
    }

    fn end_if(&mut self) {
        self.end_executable_content_region(TAG_IF);
    }

    fn start_else_if(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_ELSEIF, &[TAG_IF]);
        self.end_executable_content_region(TAG_IF);
        let mut if_id = self.current_executable_content;

        self.start_executable_content_region(true, TAG_IF);
        let else_id = self.current_executable_content;

        let else_if = If::new(Self::get_required_attr(TAG_IF, ATTR_COND, attr));
        self.add_executable_content(Box::new(else_if));

        let else_if_content_id = self.start_executable_content_region(true, TAG_ELSEIF);

        let else_if_ec = self.get_last_executable_content_entry_for_region(else_id);
        match get_opt_executable_content_as::<If>(else_if_ec) {
            Some(evc_if) => evc_if.content = else_if_content_id,
            None => panic!("Internal Error: Executable Content missing in start_else_if in region #{}", else_id),
        }

        while if_id > 0 {
            let if_ec = self.get_last_executable_content_entry_for_region(if_id);
            match get_opt_executable_content_as::<If>(if_ec) {
                Some(evc_if) => {
                    if evc_if.else_content > 0 {
                        if_id = evc_if.else_content;
                    } else {
                        if_id = 0;
                        evc_if.else_content = else_id;
                    }
                }
                None => panic!("Internal Error: Executable Content missing in start_else_if"),
            }
        }
    }

    fn start_else(&mut self, _attr: &AttributeMap) {
        self.verify_parent_tag(TAG_ELSE, &[TAG_IF]);
        self.end_executable_content_region(TAG_IF);
        let mut if_id = self.current_executable_content;

        let else_id = self.start_executable_content_region(true, TAG_IF);

        while if_id > 0 {
            let if_ec = self.get_last_executable_content_entry_for_region(if_id);
            match get_opt_executable_content_as::<If>(if_ec) {
                Some(evc_if) => {
                    if evc_if.else_content > 0 {
                        if_id = evc_if.else_content;
                    } else {
                        if_id = 0;
                        evc_if.else_content = else_id;
                    }
                }
                None => panic!("Internal Error: Executable Content missing in start_else"),
            }
        }
    }

    fn start_send(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_SEND, &[TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH]);

        let mut send_params = SendParameters::new();

        let event = attr.get(ATTR_EVENT);
        let eventexpr = attr.get(ATTR_EVENTEXPR);
        if let Some(event_value) = event {
            if eventexpr.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_SEND, ATTR_EVENT, ATTR_EVENTEXPR);
            }
            send_params.event.clone_from(event_value);
        } else if let Some(eventexpr_value) = eventexpr {
            send_params.event_expr.clone_from(eventexpr_value);
        }

        let target = attr.get(ATTR_TARGET);
        let targetexpr = attr.get(ATTR_TARGETEXPR);
        if let Some(target_val) = target {
            if targetexpr.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_SEND, ATTR_TARGET, ATTR_TARGETEXPR);
            }
            send_params.target.clone_from(target_val);
        } else if let Some(targetexpr_value) = targetexpr {
            send_params.target_expr.clone_from(targetexpr_value);
        }

        let type_attr = attr.get(ATTR_TYPE);
        let typeexpr = attr.get(ATTR_TYPEEXPR);
        if let Some(type_attr_value) = type_attr {
            if typeexpr.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_SEND, ATTR_TYPE, ATTR_TYPEEXPR);
            }
            send_params.type_value.clone_from(type_attr_value);
        } else if let Some(typeexpr_value) = typeexpr {
            send_params.type_expr.clone_from(typeexpr_value);
        }

        let id = attr.get(ATTR_ID);
        let idlocation = attr.get(ATTR_IDLOCATION);
        if let Some(id_value) = id {
            if idlocation.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_SEND, ATTR_ID, ATTR_IDLOCATION);
            }
            send_params.name.clone_from(id_value);
        } else if let Some(idlocation_value) = idlocation {
            send_params.name_location.clone_from(idlocation_value);
        }

        let delay_attr = attr.get(ATTR_DELAY);
        let delay_expr_attr = attr.get(ATTR_DELAYEXPR);
        if let Some(delay_expr_attr_value) = delay_expr_attr {
            if delay_attr.is_some() {
                panic!("{}: attributes {} and {} must not occur both", TAG_SEND, ATTR_DELAY, ATTR_DELAYEXPR);
            }
            send_params.delay_expr.clone_from(delay_expr_attr_value);
        } else if let Some(delay_attr_value) = delay_attr {
            if (!delay_attr_value.is_empty()) && type_attr.is_some() && type_attr.unwrap().eq(TARGET_INTERNAL) {
                panic!("{}: {} with {} {} is not possible", TAG_SEND, ATTR_DELAY, ATTR_TARGET, type_attr.unwrap());
            }
            let delayms = parse_duration_to_milliseconds(delay_attr_value);
            if delayms < 0 {
                panic!("{}: {} with illegal value '{}'", TAG_SEND, ATTR_DELAY, delay_attr_value);
            }
            send_params.delay_ms = delayms as u64;
        }

        if let Some(name_list_value) = attr.get(ATTR_NAMELIST) {
            send_params.name_list.clone_from(name_list_value);
        }
        self.add_executable_content(Box::new(send_params));
    }

    /// Reads the text content until the matching end-tag is encountered, by byte offset
    /// into the buffered document (since the reader borrows `&str` for the whole pass).
    fn read_content(&mut self, tag: &str, reader: &mut XReader) -> String {
        let start = BytesStart::new(tag.to_string());
        let end = start.to_end().into_owned();

        let mut buf = Vec::new();
        let content = match reader.read_to_end_into(end.name(), &mut buf) {
            Ok(span) => self.content[(span.start as usize)..(span.end as usize)].trim().to_string(),
            Err(e) => panic!("XML invalid. {}", e),
        };
        self.pop();
        content
    }

    fn start_content(&mut self, attr: &AttributeMap, reader: &mut XReader, has_content: bool) {
        self.verify_parent_tag(TAG_CONTENT, &[TAG_SEND, TAG_INVOKE, TAG_DONEDATA]);

        let parent_tag = self.get_parent_tag().to_string();
        let expr = attr.get(ATTR_EXPR);

        let content = if has_content { Some(self.read_content(TAG_CONTENT, reader)) } else { None };

        // W3C: a conformant document must not specify both 'expr' and child content.
        if expr.is_some() && content.is_some() {
            panic!("{} shall have only {} or children, but not both.", TAG_CONTENT, ATTR_EXPR);
        }

        match parent_tag.as_str() {
            TAG_DONEDATA => {
                let state = self.get_current_state();
                match state.donedata.as_mut() {
                    Some(dd) => {
                        dd.content = Some(CommonContent {
                            content,
                            content_expr: expr.cloned(),
                        });
                    }
                    None => panic!("Internal Error: donedata-Option not initialized"),
                }
            }
            TAG_INVOKE => {
                let state = self.get_current_state();
                let invoke = state.invoke.last_mut();
                invoke.content = Some(CommonContent {
                    content,
                    content_expr: expr.cloned(),
                });
            }
            TAG_SEND => {
                let ec_id = self.current_executable_content;
                if let Some(ec) = self.get_last_executable_content_entry_for_region(ec_id) {
                    let send = get_safe_executable_content_as::<SendParameters>(ec);
                    if expr.is_some() || content.is_some() {
                        send.content = Some(CommonContent {
                            content_expr: expr.cloned(),
                            content,
                        });
                    }
                }
            }
            _ => panic!("Internal Error: invalid parent-tag <{}> in start_content", parent_tag),
        }
    }

    fn start_param(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_PARAM, &[TAG_SEND, TAG_INVOKE, TAG_DONEDATA]);
        let parent_tag = self.get_parent_tag().to_string();

        let mut param = Parameter::new();
        param.name.clone_from(Self::get_required_attr(TAG_PARAM, "name", attr));
        let expr = attr.get(ATTR_EXPR);
        if let Some(expr_value) = expr {
            param.expr.clone_from(expr_value);
        }
        if let Some(location_value) = attr.get(ATTR_LOCATION) {
            if expr.is_some() {
                panic!("{} shall have only {} or {}, but not both.", TAG_PARAM, ATTR_LOCATION, ATTR_EXPR);
            }
            param.location.clone_from(location_value);
        }

        match parent_tag.as_str() {
            TAG_SEND => {
                let ec_id = self.current_executable_content;
                let ec = self.get_last_executable_content_entry_for_region(ec_id).unwrap();
                let send = get_safe_executable_content_as::<SendParameters>(ec);
                push_param(&mut send.params, param);
            }
            TAG_INVOKE => {
                let state = self.get_current_state();
                push_param(&mut state.invoke.last_mut().params, param);
            }
            TAG_DONEDATA => {
                let state = self.get_current_state();
                match state.donedata.as_mut() {
                    Some(dd) => push_param(&mut dd.params, param),
                    None => panic!("Internal Error: donedata-Option not initialized"),
                }
            }
            _ => panic!("Internal Error: invalid parent-tag <{}> in start_param", parent_tag),
        }
    }

    fn start_log(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_LOG, &[TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH, TAG_FINALIZE]);
        let label = attr.get(ATTR_LABEL);
        if let Some(exprs) = attr.get(ATTR_EXPR) {
            self.add_executable_content(Box::new(Log::new(&label, exprs.as_str())));
        }
    }

    fn start_assign(&mut self, attr: &AttributeMap, reader: &mut XReader, has_content: bool) {
        self.verify_parent_tag(TAG_ASSIGN, &[TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH, TAG_FINALIZE]);

        let mut assign = Assign::new();
        assign.location.clone_from(Self::get_required_attr(TAG_ASSIGN, ATTR_LOCATION, attr));
        if let Some(expr_value) = attr.get(ATTR_EXPR) {
            assign.expr.clone_from(expr_value);
        }

        let assign_text = if has_content { self.read_content(TAG_ASSIGN, reader) } else { String::new() };
        let assign_src = assign_text.trim();
        if !assign_src.is_empty() {
            if !assign.expr.is_empty() {
                panic!("<assign> with 'expr' attribute shall not have content.")
            }
            assign.expr = assign_src.to_string();
        }

        self.add_executable_content(Box::new(assign));
    }

    fn start_raise(&mut self, attr: &AttributeMap) {
        self.verify_parent_tag(TAG_RAISE, &[TAG_TRANSITION, TAG_ON_EXIT, TAG_ON_ENTRY, TAG_IF, TAG_FOR_EACH]);
        let mut raise = Raise::new();
        raise.event.clone_from(Self::get_required_attr(TAG_RAISE, ATTR_EVENT, attr));
        self.add_executable_content(Box::new(raise));
    }

    fn start_scxml(&mut self, attr: &AttributeMap) {
        if self.in_scxml {
            panic!("Only one <{}> allowed", TAG_SCXML);
        }
        self.in_scxml = true;
        if let Some(n) = attr.get(ATTR_NAME) {
            self.fsm.name.clone_from(n);
        }
        if let Some(datamodel) = attr.get(ATTR_DATAMODEL) {
            self.fsm.datamodel = datamodel.to_string();
        }
        if let Some(binding) = attr.get(ATTR_BINDING) {
            match BindingType::from_str(binding) {
                Ok(t) => self.fsm.binding = t,
                Err(_e) => panic!("{}: unsupported value {}", ATTR_BINDING, binding),
            }
        }
        if let Some(version_value) = attr.get(TAG_VERSION) {
            self.fsm.version.clone_from(version_value);
        }
        self.fsm.pseudo_root = self.get_or_create_state_with_attributes(attr, false, 0);
        self.current.current_state = self.fsm.pseudo_root;
        self.start_executable_content_region(false, TAG_SCXML);
    }

    fn end_scxml(&mut self) {
        self.set_default_initial(self.fsm.pseudo_root);
    }

    fn set_default_initial(&mut self, id: StateId) {
        let state = self.get_state_by_id_mut(id);
        if state.initial == 0 {
            // W3C: if not specified, the default initial state is the first child in document order.
            if let Some(first_state) = state.states.first().copied() {
                let mut t = Transition::new();
                state.initial = t.id;
                t.source = state.id;
                t.target.push(first_state);
                self.fsm.transitions.insert(t.id, t);
            }
        }
    }

    fn end_state(&mut self) {
        self.set_default_initial(self.current.current_state);
    }

    fn start_element(&mut self, reader: &mut XReader, e: &BytesStart, has_content: bool) {
        let n = e.local_name();
        let name = str::from_utf8(n.as_ref()).unwrap().to_string();
        self.push(&name);

        let attr = &decode_attributes(reader, &mut e.attributes());

        match name.as_str() {
            TAG_INCLUDE => self.include(attr),
            TAG_SCXML => self.start_scxml(attr),
            TAG_DATAMODEL => self.start_datamodel(),
            TAG_DATA => self.start_data(attr, reader, has_content),
            TAG_STATE => {
                self.start_state(attr);
            }
            TAG_PARALLEL => {
                self.start_parallel(attr);
            }
            TAG_FINAL => {
                self.start_final(attr);
            }
            TAG_DONEDATA => self.start_donedata(),
            TAG_HISTORY => {
                self.start_history(attr);
            }
            TAG_INITIAL => self.start_initial(),
            TAG_INVOKE => self.start_invoke(attr),
            TAG_TRANSITION => self.start_transition(attr),
            TAG_FINALIZE => self.start_finalize(attr),
            TAG_ON_ENTRY => self.start_on_entry(attr),
            TAG_ON_EXIT => self.start_on_exit(attr),
            TAG_SCRIPT => self.start_script(attr, reader, has_content),
            TAG_RAISE => self.start_raise(attr),
            TAG_SEND => self.start_send(attr),
            TAG_PARAM => self.start_param(attr),
            TAG_CONTENT => self.start_content(attr, reader, has_content),
            TAG_LOG => self.start_log(attr),
            TAG_ASSIGN => self.start_assign(attr, reader, has_content),
            TAG_FOR_EACH => self.start_for_each(attr),
            TAG_CANCEL => self.start_cancel(attr),
            TAG_IF => self.start_if(attr),
            TAG_ELSE => self.start_else(attr),
            TAG_ELSEIF => self.start_else_if(attr),
            _ => {
                #[cfg(feature = "Debug_Reader")]
                debug!("Ignored tag {}", name)
            }
        }
    }

    /// Resolves a path relative to the current file, or one of the configured include paths.
    fn get_resolved_path(&self, ps: &str) -> Result<PathBuf, String> {
        let mut ps = ps.to_string();
        while ps.starts_with('\\') || ps.starts_with('/') {
            ps.remove(0);
        }
        let src = Path::new(&ps);

        let to_current = match self.file.parent() {
            Some(parent_path) => parent_path.join(src),
            None => src.to_owned(),
        };
        if to_current.exists() {
            return Ok(to_current);
        }
        for ip in &self.include_paths {
            let rp = ip.join(src);
            if rp.exists() {
                return Ok(rp);
            }
        }
        Err(format!("Can not resolve {:?}", ps))
    }

    /// Handles a XInclude element. Only `parse="text"` with a relative `href` is supported;
    /// no `xpointer` fragment selection.
    /// See <https://www.w3.org/TR/xinclude/>
    fn include(&mut self, attr: &AttributeMap) {
        let href = Self::get_required_attr(TAG_INCLUDE, TAG_HREF, attr).clone();
        let parse = attr.get(ATTR_PARSE);
        if parse.is_none() || parse.unwrap().ne("text") {
            panic!("{}: only {}='text' is supported", TAG_INCLUDE, ATTR_PARSE)
        }
        if attr.get(ATTR_XPOINTER).is_some() {
            panic!("{}: {} is not supported", TAG_INCLUDE, ATTR_XPOINTER)
        }

        // Remove "include" from the parent-stack while we read the nested content.
        self.pop();

        match self.get_resolved_path(href.as_str()) {
            Ok(src) => {
                let org_file = mem::take(&mut self.file);
                let org_content = mem::take(&mut self.content);
                let rs = self.process_file(&src);
                if let Err(e) = rs {
                    panic!("Failed to read {:?}. {}", src, e);
                }
                self.file = org_file;
                self.content = org_content;
            }
            Err(err) => panic!("Can resolve path {}: {}", href, err),
        }

        self.push(TAG_INCLUDE);
    }

    fn end_element(&mut self, name: &str) {
        if !self.current.current_tag.eq(name) {
            panic!("Illegal end-tag {:?}, expected {:?}", &name, &self.current.current_tag);
        }
        match name {
            TAG_SCXML => self.end_scxml(),
            TAG_IF => self.end_if(),
            TAG_TRANSITION => self.end_transition(),
            TAG_ON_EXIT => self.end_on_exit(),
            TAG_ON_ENTRY => self.end_on_entry(),
            TAG_FOR_EACH => self.end_for_each(),
            TAG_FINALIZE => self.end_finalize(),
            TAG_STATE => self.end_state(),
            _ => {}
        }
        self.pop();
    }
}

fn decode_attributes(reader: &XReader, attr: &mut Attributes) -> AttributeMap {
    attr.map(|attr_result| match attr_result {
        Ok(a) => {
            let key = reader.decoder().decode(a.key.as_ref());
            if key.is_err() {
                panic!("unable to read attribute name {:?}, utf8 error {:?}", &a, key.err());
            }
            let value = a.decode_and_unescape_value(reader.decoder());
            if value.is_err() {
                panic!("unable to read attribute value {:?}, utf8 error {:?}", &a, value.err());
            }
            (key.unwrap().to_string(), value.unwrap().to_string())
        }
        Err(err) => panic!("unable to read key in attribute list, err = {:?}", err),
    })
    .collect()
}

/// Reads and parses an FSM from a local SCXML file.
pub fn parse_from_file(path: &str, include_paths: &[PathBuf]) -> Result<Box<Fsm>, String> {
    let mut rs = ReaderState::new();
    rs.include_paths = Vec::from(include_paths);
    match rs.process_file(Path::new(path)) {
        Ok(_m) => Ok(rs.fsm),
        Err(e) => Err(e),
    }
}

/// Parses an FSM from an in-memory SCXML document.
pub fn parse_from_xml(xml: &str) -> Result<Box<Fsm>, String> {
    let mut rs = ReaderState::new();
    rs.content = xml.to_string();
    match rs.process() {
        Ok(_m) => Ok(rs.fsm),
        Err(e) => Err(e),
    }
}

/// Parses an FSM from an in-memory SCXML document, resolving `<state src="...">`
/// and XInclude references against `include_paths`.
pub fn parse_from_xml_with_includes(xml: &str, include_paths: &[PathBuf]) -> Result<Box<Fsm>, String> {
    let mut rs = ReaderState::new();
    rs.include_paths = Vec::from(include_paths);
    rs.content = xml.to_string();
    match rs.process() {
        Ok(_m) => Ok(rs.fsm),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn initial_attribute_should_panic() {
        let _r = parse_from_xml(
            "<scxml initial='Main'><state id='Main' initial='A'>\
            <initial><transition></transition></initial></state></scxml>",
        );
    }

    #[test]
    fn script_with_src_and_content_should_panic_is_detected() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'>\
            <onentry><script src='nonexistent.js'>println();</script></onentry></state></scxml>",
        );
        assert!(r.is_err());
    }

    #[test]
    fn transitions_carry_executable_content() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'>\
            <transition event='go'><raise event='arrived'/></transition></state></scxml>",
        );
        assert!(r.is_ok());
        let fsm = r.unwrap();
        let mut found = false;
        for s in &fsm.states {
            for tid in s.transitions.iterator() {
                let tr = fsm.transitions.get(tid).unwrap();
                if tr.content != 0 {
                    found = true;
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn initial_attribute_on_compound_state() {
        let r = parse_from_xml("<scxml initial='Main'><state id='Main' initial='A'><state id='A'/></state></scxml>");
        assert!(r.is_ok());
    }

    #[test]
    fn wrong_end_tag_should_error() {
        let r = parse_from_xml("<scxml initial='Main'><state id='Main' initial='A'></parallel></scxml>");
        assert!(r.is_err(), "Shall result in error");
    }

    #[test]
    #[should_panic]
    fn wrong_parse_in_xinclude_should_panic() {
        let _r = parse_from_xml("<scxml><state><include href='nonexistent.xml' parse='xml'/></state></scxml>");
    }

    #[test]
    #[should_panic]
    fn none_parse_in_xinclude_should_panic() {
        let _r = parse_from_xml("<scxml><state><include href='nonexistent.xml'/></state></scxml>");
    }

    #[test]
    #[should_panic]
    fn xpointer_in_xinclude_should_panic() {
        let _r = parse_from_xml("<scxml><state><include href='nonexistent.xml' parse='text' xpointer='#123'/></state></scxml>");
    }

    #[test]
    #[should_panic]
    fn wrong_transition_type_should_panic() {
        let _r = parse_from_xml("<scxml><state><transition type='bla'></transition></state></scxml>");
    }

    #[test]
    fn transition_type_internal() {
        let r = parse_from_xml("<scxml><state><transition type='internal'></transition></state></scxml>");
        assert!(r.is_ok());
    }

    #[test]
    fn transition_type_external() {
        let r = parse_from_xml("<scxml><state><transition type='external'></transition></state></scxml>");
        assert!(r.is_ok());
    }

    #[test]
    #[should_panic]
    fn assign_with_expr_and_content_shall_panic() {
        let _r = parse_from_xml(
            "<scxml><state><transition><assign location='x' expr='123'>123</assign></transition></state></scxml>",
        );
    }

    #[test]
    fn assign_without_expr_and_content() {
        let r = parse_from_xml("<scxml><state><transition><assign location='x'>123</assign></transition></state></scxml>");
        assert!(r.is_ok());
    }

    #[test]
    fn if_elseif_else_chain_parses() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'><onentry>\
            <if cond='false'><raise event='a'/><elseif cond='false'/><raise event='b'/><else/><raise event='c'/></if>\
            </onentry></state></scxml>",
        );
        assert!(r.is_ok());
    }

    #[test]
    fn history_state_has_type() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'><history id='MainHist' type='deep'/>\
            <state id='A'/></state></scxml>",
        );
        assert!(r.is_ok());
        let fsm = r.unwrap();
        let hist = fsm.get_state_by_name(&"MainHist".to_string());
        assert_eq!(hist.history_type, HistoryType::Deep);
    }

    #[test]
    fn donedata_with_params_parses() {
        let r = parse_from_xml(
            "<scxml initial='Main'><final id='Main'><donedata><param name='x' expr='1'/></donedata></final></scxml>",
        );
        assert!(r.is_ok());
    }

    #[test]
    fn send_with_param_and_delay_parses() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'><transition event='go'>\
            <send event='done' delay='200ms'><param name='x' expr='1'/></send>\
            </transition></state></scxml>",
        );
        assert!(r.is_ok());
    }

    #[test]
    fn invoke_with_finalize_parses() {
        let r = parse_from_xml(
            "<scxml initial='Main'><state id='Main'><invoke type='scxml' src='child.scxml'>\
            <finalize><assign location='x' expr='1'/></finalize></invoke></state></scxml>",
        );
        assert!(r.is_ok());
    }
}
