//! Symbol table with the declaration facts the analyses consume.
//!
//! Symbols are produced by the resolver; this crate only records the facts
//! later phases ask about: what kind of declaration a symbol is, whether it
//! can be reassigned, how it is accessed, and which module declares it.

use crate::module::ModuleId;
use crate::types::TypeId;

/// Index of a symbol in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Internal,
    Protected,
    Public,
}

/// Facts about a member or local property declaration.
#[derive(Debug, Clone, Copy)]
pub struct PropertyFacts {
    /// Cross-platform `expect` declaration without a guaranteed actual shape.
    pub is_expect: bool,
    /// Storage is delegated to another object.
    pub has_delegate: bool,
    /// Declared in function scope.
    pub is_local: bool,
    /// Reassignable (`var`).
    pub is_var: bool,
    /// Declared with an extension receiver parameter.
    pub has_receiver_parameter: bool,
    /// Has a getter other than the default field read.
    pub has_custom_getter: bool,
    pub visibility: Visibility,
    /// Not open for overriding.
    pub is_final: bool,
}

impl PropertyFacts {
    /// An immutable local `val`.
    pub fn local_val() -> PropertyFacts {
        PropertyFacts {
            is_expect: false,
            has_delegate: false,
            is_local: true,
            is_var: false,
            has_receiver_parameter: false,
            has_custom_getter: false,
            visibility: Visibility::Public,
            is_final: true,
        }
    }

    /// A public final member `val` with a default accessor.
    pub fn member_val() -> PropertyFacts {
        PropertyFacts {
            is_local: false,
            ..PropertyFacts::local_val()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DeclKind {
    /// A class or named object; also the containing class of a static field
    /// reference.
    Class { is_final: bool, is_anonymous: bool },
    /// Functions are never trackable locations.
    Function,
    EnumEntry,
    /// Error-recovery placeholder produced by the resolver.
    ErrorProperty,
    ValueParameter,
    BackingField { is_val: bool },
    /// A field-like member without accessors (e.g. from Java interop).
    Field { is_final: bool },
    Property(PropertyFacts),
}

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub name: String,
    pub kind: DeclKind,
    /// Module the declaration belongs to.
    pub module: ModuleId,
    /// Declared (return) type, or `NONE`.
    pub declared_type: TypeId,
}

impl SymbolData {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> SymbolData {
        SymbolData {
            name: name.into(),
            kind,
            module: ModuleId::NONE,
            declared_type: TypeId::NONE,
        }
    }

    pub fn in_module(mut self, module: ModuleId) -> SymbolData {
        self.module = module;
        self
    }

    pub fn typed(mut self, ty: TypeId) -> SymbolData {
        self.declared_type = ty;
        self
    }
}

/// Arena of resolved symbols.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<SymbolData>,
}

impl SymbolArena {
    pub fn new() -> SymbolArena {
        SymbolArena::default()
    }

    pub fn add(&mut self, data: SymbolData) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(data);
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&SymbolData> {
        self.symbols.get(id.0 as usize)
    }

    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id).map_or("<unresolved>", |data| &data.name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
