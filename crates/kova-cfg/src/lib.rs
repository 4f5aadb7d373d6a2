//! Control-flow graph model for the kova compiler.
//!
//! The CFG builder (part of body resolution, not this crate) produces one
//! graph per declaration that owns control flow: functions, property
//! initializers, class initializers. This crate provides:
//! - The node arena (`CfgArena`, `CfgNodeId`) with per-node successor lists
//! - Node kinds (`CfgNodeKind`), including the synthetic exit markers that
//!   close sub-constructs and the stub nodes used for dead paths
//! - Graphs (`GraphId`) with nested subgraphs hanging off the node that owns
//!   them (lambdas, local functions, local classes)
//! - The registry mapping a declaration element to its graph
//! - A builder used by tests and by the (external) CFG construction phase
//!
//! Nodes reference tree elements but do not own them; node ids are assigned
//! in creation order and are used for deterministic ordering.

pub mod node;
pub use node::{CfgNode, CfgNodeId, CfgNodeKind};

pub mod graph;
pub use graph::{CfgArena, CfgBuilder, GraphData, GraphId, GraphRegistry};
