//! Variable identity registry.
//!
//! One `VariableStorage` lives for one analysis pass. Every request for a
//! variable goes through a single intern-or-fetch step keyed by structural
//! identity, so two call sites asking about the same logical location always
//! observe the same id.
//!
//! The usual pattern at call sites:
//!
//! ```text
//! let argument = storage.get_or_create_if_real(flow, argument_element, true)?;
//! let expression = storage.create_synthetic(expression_element);
//! // record an implication from `expression` to `argument`
//! ```
//!
//! Variables are only worth creating when a statement about them can lead to
//! a conclusion later: `get` probes without creating, `get_or_create_if_real`
//! creates only identities that future statements can refer back to, and
//! `get_or_create` is for callers that need a subject unconditionally.

use indexmap::IndexSet;
use kova_tree::{DeclKind, ElementArena, ElementId, ElementKind, Session, SymbolArena, SymbolId, TypeTable};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::flow::Flow;
use crate::stability::{Stability, StabilityClassifier};
use crate::unwrap::unwrap_element;
use crate::variable::{
    DfaVariable, Identifier, RealVariableData, RealVariableId, SyntheticVariableData,
    SyntheticVariableId,
};

/// The Real/Synthetic view of a classified expression.
#[derive(Debug, Clone, Copy)]
pub enum Classified {
    Real {
        variable: RealVariableId,
        symbol: SymbolId,
        dispatch_receiver: Option<RealVariableId>,
        extension_receiver: Option<RealVariableId>,
        stability: Stability,
    },
    Synthetic {
        variable: SyntheticVariableId,
        element: ElementId,
    },
}

/// Result of resolving an element before the synthetic side is interned.
///
/// A `Synthetic` resolution is a prototype: the canonical element is known
/// but nothing has been added to the table yet. Entry points decide whether
/// to look it up or to remember it.
enum Resolution {
    Real(RealVariableId),
    Synthetic(ElementId),
}

/// Pass-local, single-writer registry of data-flow variables.
pub struct VariableStorage<'a> {
    tree: &'a ElementArena,
    symbols: &'a SymbolArena,
    types: &'a TypeTable,
    session: &'a Session,
    reals: Vec<RealVariableData>,
    real_index: FxHashMap<Identifier, RealVariableId>,
    synthetics: Vec<SyntheticVariableData>,
    synthetic_index: FxHashMap<ElementId, SyntheticVariableId>,
    /// Receiver id -> variables whose identity nests it. Owned here rather
    /// than by each variable so the variables themselves stay immutable.
    dependents: FxHashMap<RealVariableId, IndexSet<RealVariableId>>,
}

impl<'a> VariableStorage<'a> {
    pub fn new(
        tree: &'a ElementArena,
        symbols: &'a SymbolArena,
        types: &'a TypeTable,
        session: &'a Session,
    ) -> VariableStorage<'a> {
        VariableStorage {
            tree,
            symbols,
            types,
            session,
            reals: Vec::new(),
            real_index: FxHashMap::default(),
            synthetics: Vec::new(),
            synthetic_index: FxHashMap::default(),
            dependents: FxHashMap::default(),
        }
    }

    /// Fresh storage for the next pass over the same tree.
    pub fn cleared(&self) -> VariableStorage<'a> {
        VariableStorage::new(self.tree, self.symbols, self.types, self.session)
    }

    fn classifier(&self) -> StabilityClassifier<'a> {
        StabilityClassifier::new(self.tree, self.symbols, self.types, self.session)
    }

    fn next_index(&self) -> u32 {
        (self.reals.len() + self.synthetics.len() + 1) as u32
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// The existing variable for `element`, or `None` if it was never
    /// created. No variables are created.
    pub fn get(
        &mut self,
        flow: &dyn Flow,
        element: ElementId,
        unwrap_alias: bool,
    ) -> Option<DfaVariable> {
        match self.resolve(flow, element, false, unwrap_alias)? {
            Resolution::Real(id) => Some(DfaVariable::Real(id)),
            Resolution::Synthetic(canonical) => self
                .synthetic_index
                .get(&canonical)
                .map(|&id| DfaVariable::Synthetic(id)),
        }
    }

    /// Interns and returns the variable if `element` has a real-variable
    /// shape; otherwise behaves like [`get`](Self::get) — synthetic variables
    /// are never fabricated speculatively.
    pub fn get_or_create_if_real(
        &mut self,
        flow: &dyn Flow,
        element: ElementId,
        unwrap_alias: bool,
    ) -> Option<DfaVariable> {
        match self.resolve(flow, element, true, unwrap_alias)? {
            Resolution::Real(id) => Some(DfaVariable::Real(id)),
            Resolution::Synthetic(canonical) => self
                .synthetic_index
                .get(&canonical)
                .map(|&id| DfaVariable::Synthetic(id)),
        }
    }

    /// Always returns a variable for `element`, interning a synthetic one on
    /// demand when no real-variable shape applies.
    pub fn get_or_create(&mut self, flow: &dyn Flow, element: ElementId, unwrap_alias: bool) -> DfaVariable {
        // Real resolution can only fail when creation is disallowed.
        match self
            .resolve(flow, element, true, unwrap_alias)
            .expect("resolution with creation enabled cannot fail")
        {
            Resolution::Real(id) => DfaVariable::Real(id),
            Resolution::Synthetic(canonical) => {
                DfaVariable::Synthetic(self.remember_synthetic(canonical))
            }
        }
    }

    /// Unconditionally interns a synthetic variable for the canonicalized
    /// element. Callers must already know no real variable applies.
    pub fn create_synthetic(&mut self, element: ElementId) -> SyntheticVariableId {
        let canonical = unwrap_element(self.tree, element);
        self.remember_synthetic(canonical)
    }

    /// The real variable for `element` without unwrapping aliases, or `None`
    /// if it was never created or has no real shape.
    pub fn get_real_without_unwrapping_alias(
        &mut self,
        flow: &dyn Flow,
        element: ElementId,
    ) -> Option<RealVariableId> {
        match self.resolve(flow, element, false, false)? {
            Resolution::Real(id) => Some(id),
            Resolution::Synthetic(_) => None,
        }
    }

    /// Interning variant of
    /// [`get_real_without_unwrapping_alias`](Self::get_real_without_unwrapping_alias).
    pub fn get_or_create_real_without_unwrapping_alias(
        &mut self,
        flow: &dyn Flow,
        element: ElementId,
    ) -> Option<RealVariableId> {
        match self.resolve(flow, element, true, false)? {
            Resolution::Real(id) => Some(id),
            Resolution::Synthetic(_) => None,
        }
    }

    /// Existing receiver-less variable for a local symbol.
    pub fn local_variable(&self, symbol: SymbolId, is_receiver: bool) -> Option<RealVariableId> {
        self.real_index
            .get(&Identifier {
                symbol,
                is_receiver,
                dispatch_receiver: None,
                extension_receiver: None,
            })
            .copied()
    }

    /// Interning variant of [`local_variable`](Self::local_variable). Locals
    /// are stable at this layer; use-site checks handle capture hazards.
    pub fn get_or_create_local_variable(
        &mut self,
        symbol: SymbolId,
        is_receiver: bool,
    ) -> RealVariableId {
        self.remember(
            Identifier {
                symbol,
                is_receiver,
                dispatch_receiver: None,
                extension_receiver: None,
            },
            Stability::StableValue,
        )
    }

    /// All receiver-less variables backed by local property symbols.
    pub fn all_local_variables(&self) -> Vec<RealVariableId> {
        self.reals
            .iter()
            .enumerate()
            .filter(|(_, data)| {
                data.dispatch_receiver.is_none()
                    && data.extension_receiver.is_none()
                    && self.symbols.get(data.symbol).is_some_and(|symbol| {
                        matches!(symbol.kind, DeclKind::Property(facts) if facts.is_local)
                    })
            })
            .map(|(index, _)| RealVariableId(index as u32))
            .collect()
    }

    /// The Real/Synthetic classification of `element`, creating the variable
    /// if needed.
    pub fn classify(&mut self, flow: &dyn Flow, element: ElementId) -> Classified {
        match self.get_or_create(flow, element, true) {
            DfaVariable::Real(variable) => {
                let data = self.real(variable);
                Classified::Real {
                    variable,
                    symbol: data.symbol,
                    dispatch_receiver: data.dispatch_receiver,
                    extension_receiver: data.extension_receiver,
                    stability: data.stability,
                }
            }
            DfaVariable::Synthetic(variable) => Classified::Synthetic {
                variable,
                element: self.synthetic(variable).element,
            },
        }
    }

    // =========================================================================
    // Remapping
    // =========================================================================

    /// The variable obtained by substituting `to` for `from` in `variable`'s
    /// receiver slots, interned. Used when a receiver's canonical
    /// representative changes mid-analysis.
    ///
    /// Panics unless `variable` is registered as dependent on `from`; calling
    /// this for an unrelated pair is a bug in the caller's bookkeeping.
    pub fn copy_with_receiver_substitution(
        &mut self,
        variable: RealVariableId,
        from: RealVariableId,
        to: RealVariableId,
    ) -> RealVariableId {
        assert!(
            self.dependents
                .get(&from)
                .is_some_and(|set| set.contains(&variable)),
            "variable {} is not dependent on receiver {}",
            self.display(variable.into()),
            self.display(from.into()),
        );
        let data = self.real(variable);
        let identifier = Identifier {
            symbol: data.symbol,
            is_receiver: data.is_receiver,
            dispatch_receiver: substitute(data.dispatch_receiver, from, to),
            extension_receiver: substitute(data.extension_receiver, from, to),
        };
        let stability = data.stability;
        self.remember(identifier, stability)
    }

    /// Re-intern a variable (and its receiver chain) from another storage,
    /// e.g. when facts outlive a recycled pass-local registry.
    pub fn adopt(&mut self, source: &VariableStorage<'_>, variable: RealVariableId) -> RealVariableId {
        let data = source.real(variable).clone();
        let dispatch_receiver = data
            .dispatch_receiver
            .map(|receiver| self.adopt(source, receiver));
        let extension_receiver = data
            .extension_receiver
            .map(|receiver| self.adopt(source, receiver));
        self.remember(
            Identifier {
                symbol: data.symbol,
                is_receiver: data.is_receiver,
                dispatch_receiver,
                extension_receiver,
            },
            data.stability,
        )
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Payload of a real variable. The id must come from this storage.
    pub fn real(&self, id: RealVariableId) -> &RealVariableData {
        &self.reals[id.0 as usize]
    }

    /// Payload of a synthetic variable. The id must come from this storage.
    pub fn synthetic(&self, id: SyntheticVariableId) -> &SyntheticVariableData {
        &self.synthetics[id.0 as usize]
    }

    pub fn stability(&self, id: RealVariableId) -> Stability {
        self.real(id).stability
    }

    pub fn identifier(&self, id: RealVariableId) -> Identifier {
        self.real(id).identifier()
    }

    /// Creation index of a variable; deterministic ordering and printing only.
    pub fn index_of(&self, variable: DfaVariable) -> u32 {
        match variable {
            DfaVariable::Real(id) => self.real(id).index,
            DfaVariable::Synthetic(id) => self.synthetic(id).index,
        }
    }

    /// Debug rendering, `d<index>`.
    pub fn display(&self, variable: DfaVariable) -> String {
        format!("d{}", self.index_of(variable))
    }

    /// Variables whose identity nests `receiver`, in creation order. These
    /// are the only variables worth rebuilding after the receiver's canonical
    /// representative changes.
    pub fn dependent_variables(
        &self,
        receiver: RealVariableId,
    ) -> impl Iterator<Item = RealVariableId> + '_ {
        self.dependents
            .get(&receiver)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn real_count(&self) -> usize {
        self.reals.len()
    }

    pub fn synthetic_count(&self) -> usize {
        self.synthetics.len()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Looking up real variables has two failure modes: the element cannot
    /// have a real variable at all, or it could but creation is disallowed
    /// and none exists. `None` encodes only the latter; the former comes back
    /// as a `Synthetic` prototype that is deliberately *not* interned, so
    /// entry points can recognize synthetic shapes with full precision.
    fn resolve(
        &mut self,
        flow: &dyn Flow,
        element: ElementId,
        create_real: bool,
        unwrap_alias: bool,
    ) -> Option<Resolution> {
        let tree = self.tree;
        let unwrapped = unwrap_element(tree, element);
        let Some(symbol) = self.trackable_symbol(unwrapped) else {
            return Some(Resolution::Synthetic(unwrapped));
        };
        let access = tree.get_access(unwrapped);

        let dispatch_receiver = match access.map(|access| access.dispatch_receiver) {
            Some(receiver) if !receiver.is_none() => {
                match self.resolve(flow, receiver, create_real, true)? {
                    Resolution::Real(id) => Some(id),
                    // A receiver tracked only by expression identity degrades
                    // the whole access to a synthetic variable.
                    Resolution::Synthetic(_) => return Some(Resolution::Synthetic(unwrapped)),
                }
            }
            _ => None,
        };
        let extension_receiver = match access.map(|access| access.extension_receiver) {
            Some(receiver) if !receiver.is_none() => {
                match self.resolve(flow, receiver, create_real, true)? {
                    Resolution::Real(id) => Some(id),
                    Resolution::Synthetic(_) => return Some(Resolution::Synthetic(unwrapped)),
                }
            }
            _ => None,
        };

        let Some(own_stability) =
            self.classifier()
                .symbol_stability(flow, symbol, access, dispatch_receiver)
        else {
            return Some(Resolution::Synthetic(unwrapped));
        };
        let stability = own_stability
            .combine(dispatch_receiver.map(|id| self.stability(id)))
            .combine(extension_receiver.map(|id| self.stability(id)));

        let identifier = Identifier {
            symbol,
            is_receiver: access.is_some_and(|access| access.is_this),
            dispatch_receiver,
            extension_receiver,
        };
        let real = if create_real {
            self.remember(identifier, stability)
        } else {
            *self.real_index.get(&identifier)?
        };
        let real = if unwrap_alias {
            flow.unwrap_variable(real)
        } else {
            real
        };
        Some(Resolution::Real(real))
    }

    /// The declaration symbol `element` resolves to, when that symbol is a
    /// traceable location: a variable-like declaration, an enum entry, a
    /// parameter, a backing field, or a `this` receiver. Functions never
    /// denote a location.
    fn trackable_symbol(&self, element: ElementId) -> Option<SymbolId> {
        match self.tree.kind(element)? {
            ElementKind::QualifiedAccess => {
                let access = self.tree.get_access(element)?;
                if access.callee.is_none() {
                    return None;
                }
                if access.is_this {
                    return Some(access.callee);
                }
                match self.symbols.get(access.callee)?.kind {
                    DeclKind::Function => None,
                    _ => Some(access.callee),
                }
            }
            ElementKind::Declaration => {
                let declaration = self.tree.get_declaration(element)?;
                if declaration.symbol.is_none() {
                    None
                } else {
                    Some(declaration.symbol)
                }
            }
            _ => None,
        }
    }

    // =========================================================================
    // Interning
    // =========================================================================

    fn remember(&mut self, identifier: Identifier, stability: Stability) -> RealVariableId {
        if let Some(&existing) = self.real_index.get(&identifier) {
            return existing;
        }
        let index = self.next_index();
        let id = RealVariableId(self.reals.len() as u32);
        self.reals.push(RealVariableData {
            symbol: identifier.symbol,
            is_receiver: identifier.is_receiver,
            dispatch_receiver: identifier.dispatch_receiver,
            extension_receiver: identifier.extension_receiver,
            stability,
            index,
        });
        self.real_index.insert(identifier, id);
        if let Some(receiver) = identifier.dispatch_receiver {
            self.dependents.entry(receiver).or_default().insert(id);
        }
        if let Some(receiver) = identifier.extension_receiver {
            self.dependents.entry(receiver).or_default().insert(id);
        }
        trace!(
            index,
            symbol = self.symbols.name(identifier.symbol),
            ?stability,
            "interned real variable"
        );
        id
    }

    fn remember_synthetic(&mut self, canonical: ElementId) -> SyntheticVariableId {
        if let Some(&existing) = self.synthetic_index.get(&canonical) {
            return existing;
        }
        let index = self.next_index();
        let id = SyntheticVariableId(self.synthetics.len() as u32);
        self.synthetics.push(SyntheticVariableData {
            element: canonical,
            index,
        });
        self.synthetic_index.insert(canonical, id);
        trace!(index, element = canonical.0, "interned synthetic variable");
        id
    }
}

fn substitute(
    receiver: Option<RealVariableId>,
    from: RealVariableId,
    to: RealVariableId,
) -> Option<RealVariableId> {
    match receiver {
        Some(id) if id == from => Some(to),
        other => other,
    }
}
