//! Exit-point and jump analysis over a statement range.
//!
//! Given a contiguous list of statements, this module determines where
//! control can go when the range finishes: does it fall through to a single
//! point, or can it escape through returns, breaks, and continues to several
//! distinct places? Callers use the answers to decide whether the range has
//! a single well-defined successor.
//!
//! Jumps targeting a function or loop wholly nested inside the range are
//! internal and ignored; only jumps that leave the range matter.

use kova_cfg::{CfgArena, CfgNodeId, GraphRegistry};
use kova_tree::{
    DeclKind, ElementArena, ElementId, ElementKind, Session, SymbolArena, SymbolId, TypeId,
    TypeTable,
};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::GraphResolutionError;
use crate::graph_index::{CfgIndex, resolve_graph};

/// A reassignment of a local variable inside the analyzed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableReassignment {
    pub element: ElementId,
    pub symbol: SymbolId,
    /// Desugared from `+=`/`-=`/`++`/`--`.
    pub is_augmented: bool,
}

/// The expression whose value the range produces when control falls through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultExpression {
    pub element: ElementId,
    pub ty: TypeId,
}

/// Everything a caller needs to know about how a statement range exits.
#[derive(Debug, Clone)]
pub struct ExitPointSnapshot {
    /// Present when the last statement is a value-producing expression.
    pub default_expression: Option<DefaultExpression>,
    /// Returns with a non-unit result, in source order.
    pub valued_returns: Vec<ElementId>,
    /// Escaping returns, breaks, and continues, in that grouping.
    pub jump_expressions: Vec<ElementId>,
    pub reassignments: Vec<VariableReassignment>,
    pub has_jumps: bool,
    /// Control can leave the range toward more than one successor.
    pub has_escaping_jumps: bool,
    /// More than one of return/break/continue occurs.
    pub has_multiple_jump_kinds: bool,
    /// The jumps alone reach more than one successor.
    pub has_multiple_jump_targets: bool,
}

/// The four derived booleans of the exit-point machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPointFlags {
    pub has_multiple_exits: bool,
    pub has_escaping_jumps: bool,
    pub has_multiple_jump_targets: bool,
    pub has_multiple_jump_kinds: bool,
}

// =============================================================================
// Jump collection
// =============================================================================

/// Syntactic walk over statement subtrees collecting escaping jumps and
/// local reassignments.
///
/// Functions and loops encountered during the walk are recorded first, so a
/// jump whose target lies inside the range is recognized as internal: the
/// walk visits ancestors before descendants.
pub struct JumpCollector<'a> {
    tree: &'a ElementArena,
    symbols: &'a SymbolArena,
    functions_in_range: FxHashSet<ElementId>,
    loops_in_range: FxHashSet<ElementId>,
    pub returns: Vec<ElementId>,
    pub breaks: Vec<ElementId>,
    pub continues: Vec<ElementId>,
    return_targets: FxHashSet<ElementId>,
    loop_targets: FxHashSet<ElementId>,
    pub reassignments: Vec<VariableReassignment>,
}

impl<'a> JumpCollector<'a> {
    pub fn new(tree: &'a ElementArena, symbols: &'a SymbolArena) -> JumpCollector<'a> {
        JumpCollector {
            tree,
            symbols,
            functions_in_range: FxHashSet::default(),
            loops_in_range: FxHashSet::default(),
            returns: Vec::new(),
            breaks: Vec::new(),
            continues: Vec::new(),
            return_targets: FxHashSet::default(),
            loop_targets: FxHashSet::default(),
            reassignments: Vec::new(),
        }
    }

    pub fn collect(&mut self, root: ElementId) {
        let mut stack: Vec<ElementId> = vec![root];
        while let Some(element) = stack.pop() {
            match self.tree.kind(element) {
                Some(ElementKind::Function | ElementKind::AnonymousFunction) => {
                    self.functions_in_range.insert(element);
                }
                Some(ElementKind::Loop) => {
                    self.loops_in_range.insert(element);
                }
                Some(ElementKind::Return) => {
                    if let Some(data) = self.tree.get_return(element) {
                        if !self.functions_in_range.contains(&data.target) {
                            self.returns.push(element);
                            self.return_targets.insert(data.target);
                        }
                    }
                }
                Some(ElementKind::Break) => {
                    if let Some(data) = self.tree.get_loop_jump(element) {
                        if !self.loops_in_range.contains(&data.target) {
                            self.breaks.push(element);
                            self.loop_targets.insert(data.target);
                        }
                    }
                }
                Some(ElementKind::Continue) => {
                    if let Some(data) = self.tree.get_loop_jump(element) {
                        if !self.loops_in_range.contains(&data.target) {
                            self.continues.push(element);
                            self.loop_targets.insert(data.target);
                        }
                    }
                }
                Some(ElementKind::Assignment) => {
                    self.record_reassignment(element);
                }
                _ => {}
            }
            let children = self.tree.children(element);
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
    }

    fn record_reassignment(&mut self, element: ElementId) {
        let Some(assignment) = self.tree.get_assignment(element) else {
            return;
        };
        let Some(access) = self.tree.get_access(assignment.lvalue) else {
            return;
        };
        let Some(symbol) = self.symbols.get(access.callee) else {
            return;
        };
        if matches!(symbol.kind, DeclKind::Property(facts) if facts.is_local) {
            self.reassignments.push(VariableReassignment {
                element,
                symbol: access.callee,
                is_augmented: assignment.is_augmented,
            });
        }
    }

    pub fn has_jumps(&self) -> bool {
        !self.return_targets.is_empty() || !self.loop_targets.is_empty()
    }

    /// Jumps of more than one kind occur: count each kind once if present.
    pub fn has_multiple_jump_kinds(&self) -> bool {
        let kinds = u32::from(!self.returns.is_empty())
            + u32::from(!self.breaks.is_empty())
            + u32::from(!self.continues.is_empty());
        kinds > 1
    }

    /// All escaping jumps: returns, then breaks, then continues.
    pub fn jump_expressions(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(
            self.returns.len() + self.breaks.len() + self.continues.len(),
        );
        out.extend_from_slice(&self.returns);
        out.extend_from_slice(&self.breaks);
        out.extend_from_slice(&self.continues);
        out
    }
}

// =============================================================================
// Exit-point analysis
// =============================================================================

pub struct ExitPointAnalyzer<'a> {
    tree: &'a ElementArena,
    symbols: &'a SymbolArena,
    types: &'a TypeTable,
    cfg: &'a CfgArena,
    registry: &'a GraphRegistry,
    session: &'a Session,
}

impl<'a> ExitPointAnalyzer<'a> {
    pub fn new(
        tree: &'a ElementArena,
        symbols: &'a SymbolArena,
        types: &'a TypeTable,
        cfg: &'a CfgArena,
        registry: &'a GraphRegistry,
        session: &'a Session,
    ) -> ExitPointAnalyzer<'a> {
        ExitPointAnalyzer {
            tree,
            symbols,
            types,
            cfg,
            registry,
            session,
        }
    }

    /// Analyze a non-empty, contiguous statement range.
    pub fn snapshot(
        &self,
        statements: &[ElementId],
    ) -> Result<ExitPointSnapshot, GraphResolutionError> {
        assert!(!statements.is_empty(), "statement range must be non-empty");

        let mut collector = JumpCollector::new(self.tree, self.symbols);
        for &statement in statements {
            collector.collect(statement);
        }

        let valued_returns: Vec<ElementId> = collector
            .returns
            .iter()
            .copied()
            .filter(|&expression| self.is_valued_return(expression))
            .collect();

        let default_statement = *statements.last().expect("non-empty range");
        let default_expression = self.default_expression(default_statement, &valued_returns);

        let graph = resolve_graph(
            self.tree,
            self.cfg,
            self.registry,
            self.session,
            statements[0],
            statements,
        )?;
        let index = CfgIndex::new(self.tree, self.cfg, graph);

        let jump_expressions = collector.jump_expressions();
        let mut escape_targets = Vec::with_capacity(jump_expressions.len() + 1);
        escape_targets.push(default_statement);
        escape_targets.extend_from_slice(&jump_expressions);

        let has_escaping_jumps = self.has_multiple_exit_points(&index, &escape_targets);
        let has_multiple_jump_targets = self.has_multiple_exit_points(&index, &jump_expressions);
        trace!(
            statements = statements.len(),
            jumps = jump_expressions.len(),
            has_escaping_jumps,
            has_multiple_jump_targets,
            "computed exit point snapshot"
        );

        Ok(ExitPointSnapshot {
            default_expression,
            valued_returns,
            has_jumps: collector.has_jumps(),
            has_multiple_jump_kinds: collector.has_multiple_jump_kinds(),
            reassignments: std::mem::take(&mut collector.reassignments),
            jump_expressions,
            has_escaping_jumps,
            has_multiple_jump_targets,
        })
    }

    /// The four derived booleans; `has_multiple_exits` is the general machine
    /// applied to the fallthrough point plus every escaping jump.
    pub fn flags(&self, statements: &[ElementId]) -> Result<ExitPointFlags, GraphResolutionError> {
        let snapshot = self.snapshot(statements)?;
        Ok(ExitPointFlags {
            has_multiple_exits: snapshot.has_escaping_jumps,
            has_escaping_jumps: snapshot.has_escaping_jumps,
            has_multiple_jump_targets: snapshot.has_multiple_jump_targets,
            has_multiple_jump_kinds: snapshot.has_multiple_jump_kinds,
        })
    }

    /// Whether the targets' downstream successors cover more than one
    /// distinct point. Targets that resolve to no CFG node contribute
    /// nothing; stub successors are bookkeeping and are skipped; exit-marker
    /// chains are looked through before comparing.
    pub fn has_multiple_exit_points(&self, index: &CfgIndex<'_>, targets: &[ElementId]) -> bool {
        let mut seen = FxHashSet::default();
        let unique: Vec<ElementId> = targets
            .iter()
            .copied()
            .filter(|&target| seen.insert(target))
            .collect();
        if unique.len() < 2 {
            return false;
        }

        let mut exit_points: Vec<CfgNodeId> = Vec::new();
        for &target in &unique {
            let Some(node) = index.find_last(target) else {
                continue;
            };
            let mut mapped: SmallVec<[CfgNodeId; 4]> = self
                .cfg
                .successors(node)
                .iter()
                .filter(|&&successor| {
                    self.cfg
                        .node(successor)
                        .is_some_and(|data| !data.kind.is_stub())
                })
                .map(|&successor| index.unwrap_exit_node(successor))
                .collect();
            mapped.sort();
            mapped.dedup();
            for point in mapped {
                if !exit_points.contains(&point) {
                    exit_points.push(point);
                }
            }
        }
        exit_points.len() > 1
    }

    fn is_valued_return(&self, expression: ElementId) -> bool {
        let Some(data) = self.tree.get_return(expression) else {
            return false;
        };
        if data.result.is_none() {
            return false;
        }
        let ty = self.tree.ty(data.result);
        !ty.is_none() && !self.types.is_unit(ty)
    }

    /// A range only has a default expression when its last statement is a
    /// value-producing expression: jumps, throws, declarations, and anything
    /// unit-, nothing-, or error-typed fall out.
    fn default_expression(
        &self,
        statement: ElementId,
        valued_returns: &[ElementId],
    ) -> Option<DefaultExpression> {
        if valued_returns.contains(&statement) {
            return None;
        }
        match self.tree.kind(statement)? {
            ElementKind::Return
            | ElementKind::Break
            | ElementKind::Continue
            | ElementKind::Throw
            | ElementKind::Error
            | ElementKind::Declaration
            | ElementKind::Assignment
            | ElementKind::Function
            | ElementKind::AnonymousFunction
            | ElementKind::Loop => None,
            _ => {
                let ty = self.tree.ty(statement);
                if ty.is_none()
                    || self.types.is_unit(ty)
                    || self.types.is_nothing(ty)
                    || self.types.is_error(ty)
                {
                    return None;
                }
                Some(DefaultExpression {
                    element: statement,
                    ty,
                })
            }
        }
    }
}
