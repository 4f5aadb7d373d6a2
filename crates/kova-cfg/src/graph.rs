//! Graph storage, registry, and builder.

use kova_tree::ElementId;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::node::{CfgNode, CfgNodeId, CfgNodeKind};

/// Index of a graph in the CFG arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(pub u32);

impl GraphId {
    pub const NONE: GraphId = GraphId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Debug)]
pub struct GraphData {
    /// Declaration element this graph was built for.
    pub owner: ElementId,
    /// Nodes of this graph, in creation order.
    pub nodes: Vec<CfgNodeId>,
}

/// Arena holding every node and graph built for one declaration family.
///
/// Subgraphs share the arena with their parent graph; node ids are globally
/// unique within the arena.
#[derive(Debug, Default)]
pub struct CfgArena {
    nodes: Vec<CfgNode>,
    graphs: Vec<GraphData>,
}

impl CfgArena {
    pub fn new() -> CfgArena {
        CfgArena::default()
    }

    #[inline]
    pub fn node(&self, id: CfgNodeId) -> Option<&CfgNode> {
        self.nodes.get(id.0 as usize)
    }

    #[inline]
    pub fn graph(&self, id: GraphId) -> Option<&GraphData> {
        self.graphs.get(id.0 as usize)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn successors(&self, id: CfgNodeId) -> &[CfgNodeId] {
        self.node(id).map_or(&[], |node| &node.successors)
    }

    /// Whether the graph or any of its nested subgraphs was generated from at
    /// least one of the candidate elements.
    pub fn contains_any(&self, graph: GraphId, candidates: &FxHashSet<ElementId>) -> bool {
        let mut pending: SmallVec<[GraphId; 4]> = SmallVec::new();
        pending.push(graph);
        while let Some(current) = pending.pop() {
            let Some(data) = self.graph(current) else {
                continue;
            };
            for &node_id in &data.nodes {
                let Some(node) = self.node(node_id) else {
                    continue;
                };
                if !node.element.is_none() && candidates.contains(&node.element) {
                    return true;
                }
                pending.extend_from_slice(&node.subgraphs);
            }
        }
        false
    }
}

/// Registry of per-declaration graphs, keyed by the owning element.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    by_owner: FxHashMap<ElementId, GraphId>,
}

impl GraphRegistry {
    pub fn new() -> GraphRegistry {
        GraphRegistry::default()
    }

    pub fn register(&mut self, owner: ElementId, graph: GraphId) {
        self.by_owner.insert(owner, graph);
    }

    /// Graph owned by the given declaration, if one was built.
    pub fn graph_for(&self, owner: ElementId) -> Option<GraphId> {
        self.by_owner.get(&owner).copied()
    }
}

/// Incremental CFG construction.
///
/// The real builder lives in body resolution; this API covers what it needs
/// and what the analysis tests assemble by hand.
#[derive(Debug, Default)]
pub struct CfgBuilder {
    arena: CfgArena,
}

impl CfgBuilder {
    pub fn new() -> CfgBuilder {
        CfgBuilder::default()
    }

    pub fn add_graph(&mut self, owner: ElementId) -> GraphId {
        let id = GraphId(self.arena.graphs.len() as u32);
        self.arena.graphs.push(GraphData {
            owner,
            nodes: Vec::new(),
        });
        id
    }

    pub fn add_node(&mut self, graph: GraphId, kind: CfgNodeKind, element: ElementId) -> CfgNodeId {
        let id = CfgNodeId(self.arena.nodes.len() as u32);
        self.arena.nodes.push(CfgNode {
            kind,
            element,
            successors: SmallVec::new(),
            subgraphs: SmallVec::new(),
        });
        if let Some(data) = self.arena.graphs.get_mut(graph.0 as usize) {
            data.nodes.push(id);
        }
        id
    }

    pub fn add_edge(&mut self, from: CfgNodeId, to: CfgNodeId) {
        if let Some(node) = self.arena.nodes.get_mut(from.0 as usize) {
            if !node.successors.contains(&to) {
                node.successors.push(to);
            }
        }
    }

    /// Attach a nested graph to the node that owns it.
    pub fn add_subgraph(&mut self, owner: CfgNodeId, graph: GraphId) {
        if let Some(node) = self.arena.nodes.get_mut(owner.0 as usize) {
            node.subgraphs.push(graph);
        }
    }

    pub fn finish(self) -> CfgArena {
        self.arena
    }
}
