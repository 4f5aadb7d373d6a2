//! Element-keyed index over a control-flow graph.
//!
//! A single tree element can produce several CFG nodes (enter/exit pairs and
//! the like); the index records them in graph order so "the last node for
//! this element" is well defined. The mapping is built once, lazily, on
//! first query and covers the graph plus every nested subgraph; a query
//! session assumes the CFG does not change underneath it.

use kova_cfg::{CfgArena, CfgNodeId, GraphId, GraphRegistry};
use kova_tree::{ElementArena, ElementId, Session};
use once_cell::unsync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::trace;

use crate::error::GraphResolutionError;

type ElementNodeMap = FxHashMap<ElementId, SmallVec<[CfgNodeId; 2]>>;

pub struct CfgIndex<'a> {
    tree: &'a ElementArena,
    cfg: &'a CfgArena,
    root: GraphId,
    mapping: OnceCell<ElementNodeMap>,
}

impl<'a> CfgIndex<'a> {
    pub fn new(tree: &'a ElementArena, cfg: &'a CfgArena, root: GraphId) -> CfgIndex<'a> {
        CfgIndex {
            tree,
            cfg,
            root,
            mapping: OnceCell::new(),
        }
    }

    fn mapping(&self) -> &ElementNodeMap {
        self.mapping.get_or_init(|| {
            let mut result = ElementNodeMap::default();
            add_graph(self.cfg, self.root, &mut result);
            trace!(
                elements = result.len(),
                graph = self.root.0,
                "built CFG element index"
            );
            result
        })
    }

    /// The last node generated from `element`, descending into the graph's
    /// subgraphs. For a block that produced no node itself, the statements
    /// are tried back to front.
    pub fn find_last(&self, element: ElementId) -> Option<CfgNodeId> {
        if let Some(nodes) = self.mapping().get(&element) {
            return nodes.last().copied();
        }
        let block = self.tree.get_block(element)?;
        block
            .statements
            .iter()
            .rev()
            .find_map(|&statement| self.find_last(statement))
    }

    /// Follow single successors through exit-like nodes, yielding the first
    /// real decision point downstream of a run of synthetic exit markers.
    pub fn unwrap_exit_node(&self, node: CfgNodeId) -> CfgNodeId {
        let mut current = node;
        loop {
            let Some(data) = self.cfg.node(current) else {
                return current;
            };
            if data.kind.is_exit_like() && data.successors.len() == 1 {
                current = data.successors[0];
            } else {
                return current;
            }
        }
    }
}

fn add_graph(cfg: &CfgArena, graph: GraphId, result: &mut ElementNodeMap) {
    let Some(data) = cfg.graph(graph) else {
        return;
    };
    for &node_id in &data.nodes {
        let Some(node) = cfg.node(node_id) else {
            continue;
        };
        if !node.element.is_none() {
            result.entry(node.element).or_default().push(node_id);
        }
        for &subgraph in &node.subgraphs {
            add_graph(cfg, subgraph, result);
        }
    }
}

/// Locate the control-flow graph covering a statement range: walk the
/// enclosing declarations of `anchor` until one owns a registered graph that
/// structurally contains at least one candidate statement.
///
/// Not every expression appears in a CFG, but if a graph holds even some of
/// the candidates it is the right one.
pub fn resolve_graph(
    tree: &ElementArena,
    cfg: &CfgArena,
    registry: &GraphRegistry,
    session: &Session,
    anchor: ElementId,
    statements: &[ElementId],
) -> Result<GraphId, GraphResolutionError> {
    let mut candidates = FxHashSet::default();
    for &statement in statements {
        add_candidate(tree, &mut candidates, statement);
    }
    for parent in tree.parents_with_self(anchor) {
        let Some(graph) = registry.graph_for(parent) else {
            continue;
        };
        if cfg.contains_any(graph, &candidates) {
            return Ok(graph);
        }
    }
    Err(GraphResolutionError {
        element: anchor,
        element_kind: tree.kind(anchor),
        module: session
            .modules
            .name(session.current_module)
            .to_string(),
    })
}

fn add_candidate(tree: &ElementArena, candidates: &mut FxHashSet<ElementId>, element: ElementId) {
    candidates.insert(element);
    if let Some(block) = tree.get_block(element) {
        for &statement in &block.statements {
            add_candidate(tree, candidates, statement);
        }
    }
}
