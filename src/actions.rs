//! Registration of native (Rust) actions that can be called from data model scripts.
//! Lets an embedder extend the data model with host functions without writing
//! them in the scripting language itself.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::datamodel::{Data, GlobalDataArc};

/// Trait to inject custom actions into the datamodel.\
/// An action is callable from script content by name, e.g. `myAction(1,2)`.
pub trait Action: Send {
    /// Executes the action with the evaluated argument list and returns its result value.
    fn execute(&self, arguments: &[Data], global: &GlobalDataArc) -> Result<Data, String>;

    /// Returns a boxed copy, so the same action can be registered under several names.
    fn get_copy(&self) -> Box<dyn Action>;
}

/// Maps an action name (as used in script source) to its native implementation.
pub type ActionMap = Mutex<HashMap<String, Box<dyn Action>>>;

/// Creates an empty, ready-to-use action registry.
pub fn new_action_map() -> ActionMap {
    Mutex::new(HashMap::new())
}
