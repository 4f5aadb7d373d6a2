//! Interface to the per-path fact store.
//!
//! The flow itself (which facts hold on which path) is maintained by the
//! data-flow analyzer that drives this crate. The registry and classifier
//! only ever ask it two questions, captured by this trait.

use kova_tree::TypeId;
use rustc_hash::FxHashMap;

use crate::variable::RealVariableId;

/// Per-path facts consulted during variable resolution.
pub trait Flow {
    /// The current canonical representative of `variable` under aliasing
    /// (`val b = a` makes `b` an alias of `a`'s variable).
    fn unwrap_variable(&self, variable: RealVariableId) -> RealVariableId {
        variable
    }

    /// Types `variable` has been proven to have on the current path.
    fn narrowed_types(&self, variable: RealVariableId) -> Vec<TypeId> {
        let _ = variable;
        Vec::new()
    }
}

/// A flow with no aliases and no narrowing facts.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrivialFlow;

impl Flow for TrivialFlow {}

/// In-memory flow used by tests and by callers that assemble facts up front.
#[derive(Debug, Default)]
pub struct RecordedFlow {
    aliases: FxHashMap<RealVariableId, RealVariableId>,
    narrowed: FxHashMap<RealVariableId, Vec<TypeId>>,
}

impl RecordedFlow {
    pub fn new() -> RecordedFlow {
        RecordedFlow::default()
    }

    pub fn set_alias(&mut self, variable: RealVariableId, representative: RealVariableId) {
        self.aliases.insert(variable, representative);
    }

    pub fn add_narrowed_type(&mut self, variable: RealVariableId, ty: TypeId) {
        self.narrowed.entry(variable).or_default().push(ty);
    }
}

impl Flow for RecordedFlow {
    fn unwrap_variable(&self, variable: RealVariableId) -> RealVariableId {
        self.aliases.get(&variable).copied().unwrap_or(variable)
    }

    fn narrowed_types(&self, variable: RealVariableId) -> Vec<TypeId> {
        self.narrowed.get(&variable).cloned().unwrap_or_default()
    }
}
