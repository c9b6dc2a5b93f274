//! Helper module to maintain FSM sessions.\
//! Owns the Event I/O Processors shared across sessions and the registry of running
//! sessions, so `<send>` targets and `<invoke>` children can reach each other by
//! session id.

use std::collections::HashMap;
use std::path::PathBuf;
#[cfg(test)]
use std::println as info;
use std::sync::mpsc::{SendError, Sender};
use std::sync::{Arc, Mutex};

#[cfg(not(test))]
use log::info;

use crate::datamodel::Data;
use crate::event_io_processor::EventIOProcessor;
use crate::fsm;
use crate::fsm::{Event, FinishMode, Fsm, InvokeId, ScxmlSession, SessionId};
use crate::scxml_event_io_processor::ScxmlEventIOProcessor;
#[cfg(feature = "xml")]
use crate::scxml_reader;
#[cfg(feature = "Trace")]
use crate::tracer::TraceMode;
use crate::ArgOption;

pub const INCLUDE_PATH_ARGUMENT_OPTION_NAME: &str = "include";

pub static INCLUDE_PATH_ARGUMENT_OPTION: ArgOption = ArgOption {
    name: INCLUDE_PATH_ARGUMENT_OPTION_NAME,
    required: false,
    with_value: true,
};

/// Reads include search paths (used to resolve relative `<state src="...">` lookups)
/// from parsed command line arguments.
pub fn include_path_from_arguments(named_arguments: &HashMap<&'static str, String>) -> Vec<PathBuf> {
    match named_arguments.get(INCLUDE_PATH_ARGUMENT_OPTION_NAME) {
        Some(value) => std::env::split_paths(value).collect(),
        None => Vec::new(),
    }
}

#[derive(Default)]
pub struct ExecuteState {
    pub processors: Vec<Box<dyn EventIOProcessor>>,
    pub sessions: HashMap<SessionId, ScxmlSession>,
}

impl ExecuteState {
    pub fn new() -> ExecuteState {
        ExecuteState {
            processors: Vec::new(),
            sessions: HashMap::new(),
        }
    }
}

/// Runs FSM sessions in separate worker threads.\
/// Maintains the Event I/O Processors shared by all sessions and the registry of
/// sessions currently running, so invoked children and `<send>` targets can be
/// resolved by session id.
#[derive(Clone)]
pub struct FsmExecutor {
    pub state: Arc<Mutex<ExecuteState>>,
    pub include_paths: Vec<PathBuf>,
}

impl FsmExecutor {
    pub fn add_processor(&mut self, processor: Box<dyn EventIOProcessor>) {
        self.state.lock().unwrap().processors.push(processor);
    }

    pub fn new() -> FsmExecutor {
        let mut e = FsmExecutor {
            state: Arc::new(Mutex::new(ExecuteState::new())),
            include_paths: Vec::new(),
        };
        e.add_processor(Box::new(ScxmlEventIOProcessor::new()));
        e
    }

    #[cfg(feature = "xml")]
    pub fn set_include_paths_from_arguments(&mut self, named_arguments: &HashMap<&'static str, String>) {
        self.set_include_paths(&include_path_from_arguments(named_arguments));
    }

    pub fn set_include_paths(&mut self, include_path: &[PathBuf]) {
        for p in include_path {
            self.include_paths.push(p.clone());
        }
    }

    /// Shuts down all Event I/O Processors.
    pub fn shutdown(&mut self) {
        let mut guard = self.state.lock().unwrap();
        while let Some(mut pp) = guard.processors.pop() {
            pp.shutdown();
        }
    }

    /// Loads (feature "xml") and starts the SCXML document at `uri`, a local file path.
    pub fn execute(
        &mut self,
        uri: &str,
        #[cfg(feature = "Trace")] trace: TraceMode,
    ) -> Result<ScxmlSession, String> {
        self.execute_with_data(
            uri,
            &HashMap::new(),
            None,
            &String::new(),
            #[cfg(feature = "Trace")]
            trace,
        )
    }

    /// Loads and starts the SCXML document at `uri` with an initial data set,
    /// optionally as an invoked child session.
    pub fn execute_with_data(
        &mut self,
        uri: &str,
        data: &HashMap<String, Data>,
        parent: Option<SessionId>,
        invoke_id: &InvokeId,
        #[cfg(feature = "Trace")] trace: TraceMode,
    ) -> Result<ScxmlSession, String> {
        info!("Loading FSM from {}", uri);

        #[cfg(feature = "xml")]
        let sm = scxml_reader::parse_from_file(uri, &self.include_paths);
        #[cfg(not(feature = "xml"))]
        let sm: Result<Box<Fsm>, String> = Err("feature \"xml\" not enabled".to_string());

        match sm {
            Ok(mut fsm) => {
                #[cfg(feature = "Trace")]
                fsm.tracer.enable_trace(trace);
                fsm.caller_invoke_id = Some(invoke_id.clone());
                fsm.parent_session_id = parent;
                Ok(fsm::start_fsm_with_data(fsm, Box::new(self.clone()), data))
            }
            Err(message) => Err(message),
        }
    }

    /// Parses `xml` (feature "xml") and starts it with an initial data set, optionally
    /// as an invoked child session.
    pub fn execute_with_data_from_xml(
        &mut self,
        xml: &str,
        data: &HashMap<String, Data>,
        parent: Option<SessionId>,
        invoke_id: &InvokeId,
        finish_mode: FinishMode,
        #[cfg(feature = "Trace")] trace: TraceMode,
    ) -> Result<ScxmlSession, String> {
        info!("Loading FSM from inline XML");

        #[cfg(feature = "xml")]
        let sm = scxml_reader::parse_from_xml_with_includes(xml, &self.include_paths);
        #[cfg(not(feature = "xml"))]
        let sm: Result<Box<Fsm>, String> = Err("feature \"xml\" not enabled".to_string());

        match sm {
            Ok(mut fsm) => {
                #[cfg(feature = "Trace")]
                fsm.tracer.enable_trace(trace);
                fsm.caller_invoke_id = Some(invoke_id.clone());
                fsm.parent_session_id = parent;
                Ok(fsm::start_fsm_with_data_and_finish_mode(
                    fsm,
                    Box::new(self.clone()),
                    data,
                    finish_mode,
                ))
            }
            Err(message) => Err(message),
        }
    }

    /// Starts an already-built [Fsm] directly, bypassing the document reader.
    pub fn execute_fsm(&mut self, fsm: Box<Fsm>, data: &HashMap<String, Data>) -> ScxmlSession {
        fsm::start_fsm_with_data(fsm, Box::new(self.clone()), data)
    }

    /// Called by a session's worker thread once it terminates with [FinishMode::DISPOSE].
    pub fn remove_session(&mut self, session_id: SessionId) {
        self.state.lock().unwrap().sessions.remove(&session_id);
    }

    pub fn get_session_sender(&self, session_id: SessionId) -> Option<Sender<Box<Event>>> {
        Some(self.state.lock().unwrap().sessions.get(&session_id)?.sender.clone())
    }

    pub fn send_to_session(&self, session_id: SessionId, event: Event) -> Result<(), SendError<Box<Event>>> {
        match self.get_session_sender(session_id) {
            None => {
                log::error!("send to unknown session #{}, dropping event '{}'", session_id, event.name);
                Ok(())
            }
            Some(sender) => sender.send(Box::new(event)),
        }
    }
}

impl Default for FsmExecutor {
    fn default() -> Self {
        FsmExecutor::new()
    }
}
