//! Smart-cast stability.
//!
//! A narrowing fact proven about a variable at one program point may only be
//! reused at a later point if nothing can have changed the value in between.
//! `Stability` ranks how safe that reuse is; the classifier derives the rank
//! of a symbol from its declaration facts, and ranks along a receiver chain
//! are folded together with `combine`.

use kova_tree::element::QualifiedAccessData;
use kova_tree::{DeclKind, ElementArena, Session, SymbolArena, SymbolId, TypeId, TypeTable};

use crate::flow::Flow;
use crate::variable::RealVariableId;

/// How safe it is to assume a previously proven fact still holds.
/// Ascending order is increasingly unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stability {
    /// Cannot be reassigned or recomputed between observations.
    StableValue,
    /// A local that a use-site check may still demote when it is captured
    /// and reassigned concurrently. Never produced by the classifier here.
    LocalVariable,
    /// `expect` declaration; the actual platform shape is not guaranteed.
    ExpectProperty,
    /// A getter may compute a fresh value on every access.
    PropertyWithGetter,
    /// Public member of a foreign module; an ABI-compatible update could add
    /// a getter without this module noticing.
    AlienPublicProperty,
    /// Reassignable between observations.
    MutableProperty,
    /// Reads go through a delegate object.
    DelegatedProperty,
}

impl Stability {
    /// Fold a receiver rank into this one: the combined rank is the worse of
    /// the two. `None` means the receiver slot is absent and contributes
    /// nothing.
    ///
    /// Panics if a `LocalVariable` rank meets anything above `LocalVariable`;
    /// a local-variable receiver chain can only ever be built from locals and
    /// stable values, so such a combination is a caller bug.
    pub fn combine(self, receiver: Option<Stability>) -> Stability {
        let Some(receiver) = receiver else {
            return self;
        };
        if self == Stability::LocalVariable || receiver == Stability::LocalVariable {
            assert!(
                self <= Stability::LocalVariable && receiver <= Stability::LocalVariable,
                "cannot combine {self:?} with {receiver:?}"
            );
        }
        self.max(receiver)
    }
}

/// Derives the stability rank of a resolved symbol at a given access.
pub struct StabilityClassifier<'a> {
    tree: &'a ElementArena,
    symbols: &'a SymbolArena,
    types: &'a TypeTable,
    session: &'a Session,
}

impl<'a> StabilityClassifier<'a> {
    pub fn new(
        tree: &'a ElementArena,
        symbols: &'a SymbolArena,
        types: &'a TypeTable,
        session: &'a Session,
    ) -> StabilityClassifier<'a> {
        StabilityClassifier {
            tree,
            symbols,
            types,
            session,
        }
    }

    /// Rank of `symbol` when accessed through `access`, or `None` when the
    /// symbol does not denote a trackable location at all.
    ///
    /// `dispatch_receiver` is the already-interned receiver variable, used
    /// only to look up narrowing facts for the open-member finality check;
    /// the receiver's own rank is folded in by the caller.
    pub fn symbol_stability(
        &self,
        flow: &dyn Flow,
        symbol: SymbolId,
        access: Option<&QualifiedAccessData>,
        dispatch_receiver: Option<RealVariableId>,
    ) -> Option<Stability> {
        if access.is_some_and(|access| access.is_this) {
            return Some(Stability::StableValue);
        }
        let data = self.symbols.get(symbol)?;
        match data.kind {
            DeclKind::Function => None,
            // Named objects and containing classes of static references.
            DeclKind::Class { .. } => Some(Stability::StableValue),
            DeclKind::EnumEntry | DeclKind::ErrorProperty | DeclKind::ValueParameter => {
                Some(Stability::StableValue)
            }
            DeclKind::BackingField { is_val } => Some(if is_val {
                Stability::StableValue
            } else {
                Stability::MutableProperty
            }),
            DeclKind::Field { is_final } => Some(if is_final {
                self.module_stability(data.module)
            } else {
                Stability::MutableProperty
            }),
            DeclKind::Property(facts) => Some(if facts.is_expect {
                Stability::ExpectProperty
            } else if facts.has_delegate {
                Stability::DelegatedProperty
            } else if facts.is_local {
                // Locals are only unstable under concurrent reassignment,
                // which the consuming checker verifies per use site.
                Stability::StableValue
            } else if facts.is_var {
                Stability::MutableProperty
            } else if facts.has_receiver_parameter || facts.has_custom_getter {
                Stability::PropertyWithGetter
            } else if facts.visibility == kova_tree::Visibility::Private {
                Stability::StableValue
            } else if !facts.is_final && !self.has_final_dispatch_receiver(flow, access, dispatch_receiver)
            {
                // An open val with a default getter is only trustworthy when
                // the receiver's exact runtime class is known to be final.
                Stability::PropertyWithGetter
            } else {
                self.module_stability(data.module)
            }),
        }
    }

    /// Public member with a default accessor: stable inside the declaring
    /// module and its friends, alien elsewhere. Adding a getter in another
    /// module is an ABI-compatible change dependents would not see.
    fn module_stability(&self, module: kova_tree::ModuleId) -> Stability {
        if module.is_none() || self.session.is_friendly_module(module) {
            Stability::StableValue
        } else {
            Stability::AlienPublicProperty
        }
    }

    /// Whether the dispatch receiver's statically narrowed type is a final
    /// class: its declared type, or any type the flow has narrowed the
    /// receiver variable to.
    fn has_final_dispatch_receiver(
        &self,
        flow: &dyn Flow,
        access: Option<&QualifiedAccessData>,
        dispatch_receiver: Option<RealVariableId>,
    ) -> bool {
        let Some(access) = access else {
            return false;
        };
        let receiver = access.dispatch_receiver;
        if receiver.is_none() {
            return false;
        }
        if self.is_final_type(self.tree.ty(receiver)) == Some(true) {
            return true;
        }
        let Some(variable) = dispatch_receiver else {
            return false;
        };
        flow.narrowed_types(variable)
            .iter()
            .any(|&ty| self.is_final_type(ty) == Some(true))
    }

    fn is_final_type(&self, ty: TypeId) -> Option<bool> {
        let symbol = self.types.class_symbol(ty)?;
        match self.symbols.get(symbol)?.kind {
            DeclKind::Class {
                is_final,
                is_anonymous,
            } => Some(is_anonymous || is_final),
            _ => None,
        }
    }
}
