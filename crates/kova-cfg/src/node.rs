//! CFG nodes.

use kova_tree::ElementId;
use smallvec::SmallVec;

use crate::graph::GraphId;

/// Index of a node in the CFG arena. Ids are assigned in creation order,
/// so sorting by id gives a deterministic, construction-stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CfgNodeId(pub u32);

impl CfgNodeId {
    pub const NONE: CfgNodeId = CfgNodeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Kind of a CFG node.
///
/// The `*Exit` kinds mark the completion of a sub-construct rather than a
/// real branch point; exit-point analysis looks through them when they have
/// a single successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfgNodeKind {
    /// Entry of a graph.
    Enter,
    /// Exit of a graph (function exit, initializer exit).
    Exit,
    /// An ordinary node generated from a statement or expression.
    Statement,
    /// A node with more than one successor (condition, when dispatch).
    Branch,
    /// A join of several predecessors.
    Merge,
    /// Bookkeeping node on a dead or impossible path.
    Stub,
    ValueParameterExit,
    WhenSubjectExit,
    AnonymousObjectExit,
    SmartCastExit,
    PostponedLambdaExit,
    DelegateExpressionExit,
    WhenBranchResultExit,
    ElvisExit,
    ElvisLhsExit,
    SafeCallExit,
    LocalClassExit,
}

impl CfgNodeKind {
    /// Whether this node marks the end of a sub-construct.
    pub fn is_exit_like(self) -> bool {
        matches!(
            self,
            CfgNodeKind::Exit
                | CfgNodeKind::ValueParameterExit
                | CfgNodeKind::WhenSubjectExit
                | CfgNodeKind::AnonymousObjectExit
                | CfgNodeKind::SmartCastExit
                | CfgNodeKind::PostponedLambdaExit
                | CfgNodeKind::DelegateExpressionExit
                | CfgNodeKind::WhenBranchResultExit
                | CfgNodeKind::ElvisExit
                | CfgNodeKind::ElvisLhsExit
                | CfgNodeKind::SafeCallExit
                | CfgNodeKind::LocalClassExit
        )
    }

    pub fn is_stub(self) -> bool {
        self == CfgNodeKind::Stub
    }
}

#[derive(Debug)]
pub struct CfgNode {
    pub kind: CfgNodeKind,
    /// Tree element this node was generated from, or `NONE` for purely
    /// synthetic nodes.
    pub element: ElementId,
    /// Outgoing edges, in construction order.
    pub successors: SmallVec<[CfgNodeId; 2]>,
    /// Subgraphs owned by this node (lambdas, local declarations).
    pub subgraphs: SmallVec<[GraphId; 1]>,
}
