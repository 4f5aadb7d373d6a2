//! Minimal resolved-type table.
//!
//! The analyses in this workspace only ask a handful of questions about
//! types: is this `Unit`/`Nothing`/an error type, and does this class type
//! resolve to a final class. The table interns class types by symbol so a
//! `TypeId` comparison is an identity comparison.

use crate::symbol::SymbolId;
use rustc_hash::FxHashMap;

/// Interned type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const UNIT: TypeId = TypeId(0);
    pub const NOTHING: TypeId = TypeId(1);
    pub const ERROR: TypeId = TypeId(2);
    pub const NONE: TypeId = TypeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Unit,
    Nothing,
    Error,
    Class { symbol: SymbolId },
}

#[derive(Debug)]
pub struct TypeTable {
    types: Vec<TypeKind>,
    class_index: FxHashMap<SymbolId, TypeId>,
}

impl TypeTable {
    pub fn new() -> TypeTable {
        TypeTable {
            types: vec![TypeKind::Unit, TypeKind::Nothing, TypeKind::Error],
            class_index: FxHashMap::default(),
        }
    }

    /// Intern the type of a class symbol.
    pub fn class_type(&mut self, symbol: SymbolId) -> TypeId {
        if let Some(&existing) = self.class_index.get(&symbol) {
            return existing;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeKind::Class { symbol });
        self.class_index.insert(symbol, id);
        id
    }

    #[inline]
    pub fn get(&self, id: TypeId) -> Option<TypeKind> {
        self.types.get(id.0 as usize).copied()
    }

    pub fn is_unit(&self, id: TypeId) -> bool {
        self.get(id) == Some(TypeKind::Unit)
    }

    pub fn is_nothing(&self, id: TypeId) -> bool {
        self.get(id) == Some(TypeKind::Nothing)
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        self.get(id) == Some(TypeKind::Error)
    }

    /// The class symbol behind a class type, or `None` for every other kind.
    pub fn class_symbol(&self, id: TypeId) -> Option<SymbolId> {
        match self.get(id)? {
            TypeKind::Class { symbol } => Some(symbol),
            _ => None,
        }
    }
}

impl Default for TypeTable {
    fn default() -> TypeTable {
        TypeTable::new()
    }
}
