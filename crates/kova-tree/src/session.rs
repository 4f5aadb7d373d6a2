//! Per-invocation analysis session.

use crate::module::{ModuleGraph, ModuleId};

/// Context shared by one analysis invocation: which module is being compiled
/// and how it relates to the rest of the module graph.
#[derive(Debug)]
pub struct Session {
    pub modules: ModuleGraph,
    pub current_module: ModuleId,
}

impl Session {
    pub fn new(modules: ModuleGraph, current_module: ModuleId) -> Session {
        Session {
            modules,
            current_module,
        }
    }

    /// Session with a single module; enough for most tests.
    pub fn single_module(name: impl Into<String>) -> Session {
        let mut modules = ModuleGraph::new();
        let current_module = modules.add_module(name);
        Session {
            modules,
            current_module,
        }
    }

    /// Whether declarations from `module` are as trustworthy as our own:
    /// the current module itself, a friend, or a `dependsOn` dependency.
    pub fn is_friendly_module(&self, module: ModuleId) -> bool {
        self.modules.is_friendly(self.current_module, module)
    }
}
