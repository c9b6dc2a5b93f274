//! Structured, feature-gated tracing of the interpreter's internals.\
//! Mirrors the shape of the algorithm in [crate::fsm]: entering/exiting the named
//! procedures of the W3C pseudo-code, the arguments and results they compute, and the
//! states and events flowing through the main event loop.
//!
//! Disabled by default; enabled per-facet via [TraceMode] so a session can be watched
//! without paying for string formatting on every call when tracing is off.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use log::{debug, trace};

use crate::fsm::{Event, State, StateId};
use crate::ArgOption;

/// Which facets of the interpreter a [Tracer] should report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// No tracing.
    Off,
    /// Trace entry/exit of algorithm methods.
    Methods,
    /// Trace state entry/exit.
    States,
    /// Trace events flowing through the queues.
    Events,
    /// Trace method arguments and results.
    Arguments,
    Results,
    /// All of the above.
    All,
}

impl FromStr for TraceMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "" => Ok(TraceMode::Off),
            "methods" | "method" => Ok(TraceMode::Methods),
            "states" | "state" => Ok(TraceMode::States),
            "events" | "event" => Ok(TraceMode::Events),
            "arguments" | "argument" => Ok(TraceMode::Arguments),
            "results" | "result" => Ok(TraceMode::Results),
            "all" => Ok(TraceMode::All),
            _ => Err(()),
        }
    }
}

pub const TRACE_ARGUMENT_OPTION_NAME: &str = "trace";

pub static TRACE_ARGUMENT_OPTION: ArgOption = ArgOption {
    name: TRACE_ARGUMENT_OPTION_NAME,
    required: false,
    with_value: true,
};

impl TraceMode {
    /// Reads the trace mode from parsed command line arguments, defaulting to `Off`.
    pub fn from_arguments(named_arguments: &HashMap<&'static str, String>) -> TraceMode {
        match named_arguments.get(TRACE_ARGUMENT_OPTION_NAME) {
            Some(value) => TraceMode::from_str(value).unwrap_or(TraceMode::Off),
            None => TraceMode::Off,
        }
    }
}

/// Observes the interpreter while it runs.\
/// Implementations may log, collect a replayable session trace, or (as
/// [crate::test_tracer::TestTracer] does) assert on the final configuration reached.
pub trait Tracer: Send {
    fn enable_trace(&mut self, mode: TraceMode);

    fn trace_mode(&self) -> TraceMode;

    fn enter_method(&mut self, method: &str);
    fn exit_method(&mut self, method: &str);

    fn trace_argument(&mut self, name: &str, value: &dyn Display);
    fn trace_result(&mut self, name: &str, value: &dyn Display);

    fn trace_enter_state(&mut self, state: &State);
    fn trace_exit_state(&mut self, state_id: &StateId);

    fn event_internal_received(&mut self, event: &Event);
    fn event_external_received(&mut self, event: &Event);
    fn event_internal_send(&mut self, event: &Event);

    /// Free-form trace line, used for the `trace` event injected by [crate::handle_trace].
    fn trace(&mut self, message: &str);
}

/// Tracer that forwards everything to the `log` crate at debug/trace level.
pub struct DefaultTracer {
    mode: TraceMode,
}

impl DefaultTracer {
    pub fn new() -> DefaultTracer {
        DefaultTracer { mode: TraceMode::Off }
    }

    fn active(&self, mode: TraceMode) -> bool {
        self.mode == TraceMode::All || self.mode == mode
    }
}

impl Default for DefaultTracer {
    fn default() -> Self {
        DefaultTracer::new()
    }
}

impl Tracer for DefaultTracer {
    fn enable_trace(&mut self, mode: TraceMode) {
        self.mode = mode;
    }

    fn trace_mode(&self) -> TraceMode {
        self.mode
    }

    fn enter_method(&mut self, method: &str) {
        if self.active(TraceMode::Methods) {
            trace!("-> {}", method);
        }
    }

    fn exit_method(&mut self, method: &str) {
        if self.active(TraceMode::Methods) {
            trace!("<- {}", method);
        }
    }

    fn trace_argument(&mut self, name: &str, value: &dyn Display) {
        if self.active(TraceMode::Arguments) {
            trace!("  arg {} = {}", name, value);
        }
    }

    fn trace_result(&mut self, name: &str, value: &dyn Display) {
        if self.active(TraceMode::Results) {
            trace!("  result {} = {}", name, value);
        }
    }

    fn trace_enter_state(&mut self, state: &State) {
        if self.active(TraceMode::States) {
            debug!("enter state {}", state.name);
        }
    }

    fn trace_exit_state(&mut self, state_id: &StateId) {
        if self.active(TraceMode::States) {
            debug!("exit state #{}", state_id);
        }
    }

    fn event_internal_received(&mut self, event: &Event) {
        if self.active(TraceMode::Events) {
            debug!("internal event received: {}", event.name);
        }
    }

    fn event_external_received(&mut self, event: &Event) {
        if self.active(TraceMode::Events) {
            debug!("external event received: {}", event.name);
        }
    }

    fn event_internal_send(&mut self, event: &Event) {
        if self.active(TraceMode::Events) {
            debug!("internal event raised: {}", event.name);
        }
    }

    fn trace(&mut self, message: &str) {
        debug!("{}", message);
    }
}
