//! Tracer used by the test harness ([crate::test]) to record the final state
//! configuration reached by a session and to guard against hung tests.

use std::collections::HashMap;
use std::fmt::Display;
use std::process;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::fsm::{Event, State, StateId};
use crate::tracer::{TraceMode, Tracer};

pub type FsmConfig = Arc<Mutex<HashMap<String, bool>>>;

/// Prints the message and terminates the test process with a failure code.
pub fn abort_test(message: String) -> ! {
    eprintln!("TEST FAILED: {}", message);
    process::exit(1);
}

/// Collects the live state configuration as the interpreter enters/exits states,
/// so the test harness can assert on it once the session has finished.
pub struct TestTracer {
    mode: TraceMode,
    config: FsmConfig,
    id_to_name: HashMap<StateId, String>,
}

impl TestTracer {
    pub fn new() -> TestTracer {
        TestTracer {
            mode: TraceMode::Off,
            config: Arc::new(Mutex::new(HashMap::new())),
            id_to_name: HashMap::new(),
        }
    }

    pub fn get_fsm_config(&self) -> FsmConfig {
        self.config.clone()
    }

    /// Spawns a watchdog that aborts the process if the test is not finished
    /// (via [TestTracer::disable_watchdog]) within `timeout_ms` milliseconds.
    pub fn start_watchdog(test_name: &str, timeout_ms: u64) -> Box<Sender<String>> {
        let (tx, rx) = channel::<String>();
        let name = test_name.to_string();
        thread::spawn(move || {
            if rx.recv_timeout(Duration::from_millis(timeout_ms)).is_err() {
                abort_test(format!("test '{}' timed out after {}ms", name, timeout_ms));
            }
        });
        Box::new(tx)
    }

    pub fn disable_watchdog(sender: &Sender<String>) {
        let _ = sender.send("done".to_string());
    }

    /// Checks that every expected state name is part of the reached configuration.
    pub fn verify_final_configuration(
        expected: &[String],
        current: &FsmConfig,
    ) -> Result<String, String> {
        let guard = current.lock().unwrap();
        for name in expected {
            if !guard.get(name).copied().unwrap_or(false) {
                return Err(name.clone());
            }
        }
        Ok(expected.join(","))
    }
}

impl Default for TestTracer {
    fn default() -> Self {
        TestTracer::new()
    }
}

impl Tracer for TestTracer {
    fn enable_trace(&mut self, mode: TraceMode) {
        self.mode = mode;
    }

    fn trace_mode(&self) -> TraceMode {
        self.mode
    }

    fn enter_method(&mut self, _method: &str) {}
    fn exit_method(&mut self, _method: &str) {}

    fn trace_argument(&mut self, _name: &str, _value: &dyn Display) {}
    fn trace_result(&mut self, _name: &str, _value: &dyn Display) {}

    fn trace_enter_state(&mut self, state: &State) {
        self.id_to_name.insert(state.id, state.name.clone());
        self.config.lock().unwrap().insert(state.name.clone(), true);
    }

    fn trace_exit_state(&mut self, state_id: &StateId) {
        if let Some(name) = self.id_to_name.get(state_id) {
            self.config.lock().unwrap().insert(name.clone(), false);
        }
    }

    fn event_internal_received(&mut self, _event: &Event) {}
    fn event_external_received(&mut self, _event: &Event) {}
    fn event_internal_send(&mut self, _event: &Event) {}

    fn trace(&mut self, _message: &str) {}
}
