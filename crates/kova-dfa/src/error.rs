//! Analysis errors.

use kova_tree::{ElementId, ElementKind};
use std::fmt;

/// No enclosing declaration owns a control-flow graph containing the
/// requested elements.
///
/// This is a hard failure: the input shape is unsupported or malformed, not
/// a normal absence, and callers surface it as an internal-error diagnostic
/// rather than guessing at an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResolutionError {
    /// The anchor element a graph was searched for.
    pub element: ElementId,
    pub element_kind: Option<ElementKind>,
    /// Name of the module being analyzed.
    pub module: String,
}

impl fmt::Display for GraphResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot find a control flow graph for element #{}",
            self.element.0
        )?;
        if let Some(kind) = self.element_kind {
            write!(f, " ({kind:?})")?;
        }
        write!(f, " in module `{}`", self.module)
    }
}

impl std::error::Error for GraphResolutionError {}
