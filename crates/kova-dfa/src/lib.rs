//! Data-flow analysis support for the kova compiler.
//!
//! This crate answers two families of questions for the checker:
//!
//! ## Variable identity and smart-cast stability
//! - Which expressions denote the *same* runtime value (`unwrap_element`)
//! - A deduplicating registry assigning one identity per trackable location
//!   (`VariableStorage`, `DfaVariable`)
//! - How trustworthy a previously proven type fact about a location is at a
//!   later program point (`Stability`, `StabilityClassifier`)
//!
//! ## Control-flow structure
//! - Indexing a CFG by tree element (`CfgIndex`)
//! - Whether a statement range can exit to more than one place, and how its
//!   jumps are shaped (`ExitPointAnalyzer`, `ExitPointSnapshot`)
//!
//! All structures here are pass-local: built, queried, and discarded within
//! one analysis invocation. Concurrent invocations use independent instances;
//! nothing in this crate locks.

pub mod unwrap;
pub use unwrap::unwrap_element;

pub mod stability;
pub use stability::{Stability, StabilityClassifier};

pub mod flow;
pub use flow::{Flow, RecordedFlow, TrivialFlow};

pub mod variable;
pub use variable::{
    DfaVariable, Identifier, RealVariableData, RealVariableId, SyntheticVariableData,
    SyntheticVariableId,
};

pub mod storage;
pub use storage::{Classified, VariableStorage};

pub mod error;
pub use error::GraphResolutionError;

pub mod graph_index;
pub use graph_index::{CfgIndex, resolve_graph};

pub mod exit_points;
pub use exit_points::{
    DefaultExpression, ExitPointAnalyzer, ExitPointFlags, ExitPointSnapshot, JumpCollector,
    VariableReassignment,
};
