//! Resolved tree model for the kova compiler.
//!
//! This crate provides the data the later analysis phases consume:
//! - The resolved expression/declaration tree (`ElementArena`, `ElementId`),
//!   with parent pointers and per-kind payload pools
//! - The symbol table (`SymbolArena`, `SymbolId`) carrying declaration facts
//! - The module dependency graph (`ModuleGraph`, `ModuleId`)
//! - A minimal resolved-type table (`TypeTable`, `TypeId`)
//! - The per-invocation `Session` bundling module context
//!
//! The tree is produced by the parser/resolver pipeline; analyses only read
//! it. Every qualified access in the tree already carries its resolved callee
//! symbol and receiver expressions.

pub mod element;
pub use element::{Element, ElementArena, ElementId, ElementKind};

pub mod symbol;
pub use symbol::{DeclKind, PropertyFacts, SymbolArena, SymbolData, SymbolId, Visibility};

pub mod module;
pub use module::{ModuleData, ModuleGraph, ModuleId};

pub mod types;
pub use types::{TypeId, TypeKind, TypeTable};

pub mod session;
pub use session::Session;
