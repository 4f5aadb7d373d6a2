use kova_cfg::{CfgBuilder, CfgNodeKind, GraphRegistry};
use kova_tree::{ElementArena, ElementId, TypeId};
use rustc_hash::FxHashSet;

#[test]
fn node_ids_follow_creation_order() {
    let mut tree = ElementArena::new();
    let owner = tree.add_literal(TypeId::NONE);

    let mut builder = CfgBuilder::new();
    let graph = builder.add_graph(owner);
    let enter = builder.add_node(graph, CfgNodeKind::Enter, ElementId::NONE);
    let statement = builder.add_node(graph, CfgNodeKind::Statement, owner);
    let exit = builder.add_node(graph, CfgNodeKind::Exit, ElementId::NONE);
    builder.add_edge(enter, statement);
    builder.add_edge(statement, exit);
    let arena = builder.finish();

    assert!(enter < statement && statement < exit);
    assert_eq!(arena.graph(graph).unwrap().nodes, vec![enter, statement, exit]);
    assert_eq!(arena.successors(statement), &[exit]);
    assert_eq!(arena.node_count(), 3);
}

#[test]
fn duplicate_edges_are_kept_once() {
    let mut builder = CfgBuilder::new();
    let graph = builder.add_graph(ElementId::NONE);
    let a = builder.add_node(graph, CfgNodeKind::Statement, ElementId::NONE);
    let b = builder.add_node(graph, CfgNodeKind::Statement, ElementId::NONE);
    builder.add_edge(a, b);
    builder.add_edge(a, b);
    let arena = builder.finish();

    assert_eq!(arena.successors(a), &[b]);
}

#[test]
fn contains_any_descends_into_subgraphs() {
    let mut tree = ElementArena::new();
    let outer_el = tree.add_literal(TypeId::NONE);
    let inner_el = tree.add_literal(TypeId::NONE);
    let absent_el = tree.add_literal(TypeId::NONE);

    let mut builder = CfgBuilder::new();
    let outer = builder.add_graph(outer_el);
    let lambda_node = builder.add_node(outer, CfgNodeKind::Statement, outer_el);
    let inner = builder.add_graph(inner_el);
    builder.add_node(inner, CfgNodeKind::Statement, inner_el);
    builder.add_subgraph(lambda_node, inner);
    let arena = builder.finish();

    let direct: FxHashSet<_> = [outer_el].into_iter().collect();
    let nested: FxHashSet<_> = [inner_el].into_iter().collect();
    let missing: FxHashSet<_> = [absent_el].into_iter().collect();
    assert!(arena.contains_any(outer, &direct));
    assert!(arena.contains_any(outer, &nested));
    assert!(!arena.contains_any(outer, &missing));
}

#[test]
fn exit_like_kinds() {
    assert!(CfgNodeKind::Exit.is_exit_like());
    assert!(CfgNodeKind::SafeCallExit.is_exit_like());
    assert!(CfgNodeKind::ElvisLhsExit.is_exit_like());
    assert!(CfgNodeKind::WhenBranchResultExit.is_exit_like());
    assert!(!CfgNodeKind::Statement.is_exit_like());
    assert!(!CfgNodeKind::Branch.is_exit_like());
    assert!(!CfgNodeKind::Stub.is_exit_like());
    assert!(CfgNodeKind::Stub.is_stub());
}

#[test]
fn registry_maps_owners_to_graphs() {
    let mut tree = ElementArena::new();
    let owner = tree.add_literal(TypeId::NONE);
    let other = tree.add_literal(TypeId::NONE);

    let mut builder = CfgBuilder::new();
    let graph = builder.add_graph(owner);
    let mut registry = GraphRegistry::new();
    registry.register(owner, graph);

    assert_eq!(registry.graph_for(owner), Some(graph));
    assert_eq!(registry.graph_for(other), None);
}
