use kova_tree::{
    DeclKind, ElementArena, ElementId, ElementKind, ModuleGraph, PropertyFacts, Session,
    SymbolArena, SymbolData, TypeId, TypeTable,
};

fn local_symbol(symbols: &mut SymbolArena, name: &str) -> kova_tree::SymbolId {
    symbols.add(SymbolData::new(
        name,
        DeclKind::Property(PropertyFacts::local_val()),
    ))
}

#[test]
fn parents_are_linked_at_creation() {
    let mut symbols = SymbolArena::new();
    let mut tree = ElementArena::new();
    let x = local_symbol(&mut symbols, "x");

    let access = tree.add_access(x, ElementId::NONE, ElementId::NONE, TypeId::NONE);
    let ret = tree.add_return(ElementId::NONE, access);
    let block = tree.add_block(vec![ret], TypeId::NONE);

    assert_eq!(tree.parent(access), ret);
    assert_eq!(tree.parent(ret), block);
    assert_eq!(tree.parent(block), ElementId::NONE);

    let chain: Vec<ElementId> = tree.parents_with_self(access).collect();
    assert_eq!(chain, vec![access, ret, block]);
}

#[test]
fn children_follow_source_order() {
    let mut symbols = SymbolArena::new();
    let mut tree = ElementArena::new();
    let x = local_symbol(&mut symbols, "x");

    let first = tree.add_access(x, ElementId::NONE, ElementId::NONE, TypeId::NONE);
    let second = tree.add_literal(TypeId::UNIT);
    let block = tree.add_block(vec![first, second], TypeId::NONE);

    let children = tree.children(block);
    assert_eq!(children.as_slice(), &[first, second]);
}

#[test]
fn back_references_are_not_children() {
    let mut tree = ElementArena::new();
    let lit = tree.add_literal(TypeId::UNIT);
    let ret = tree.add_return(ElementId::NONE, lit);
    let body = tree.add_block(vec![ret], TypeId::NONE);
    let mut symbols = SymbolArena::new();
    let f = symbols.add(SymbolData::new("f", DeclKind::Function));
    let function = tree.add_function(f, body);
    tree.set_return_target(ret, function);

    assert_eq!(tree.get_return(ret).unwrap().target, function);
    // The target link does not make the function a child of the return.
    assert_eq!(tree.children(ret).as_slice(), &[lit]);
    // And the return's parent chain still reaches the function via the block.
    assert!(tree.parents_with_self(ret).any(|el| el == function));
}

#[test]
fn payload_accessors_check_kinds() {
    let mut tree = ElementArena::new();
    let lit = tree.add_literal(TypeId::UNIT);
    let cast = tree.add_cast(lit, false, TypeId::NONE);

    assert!(tree.get_cast(cast).is_some());
    assert!(tree.get_block(cast).is_none());
    assert!(tree.get_cast(lit).is_none());
    assert_eq!(tree.kind(cast), Some(ElementKind::Cast));
}

#[test]
fn class_types_are_interned() {
    let mut symbols = SymbolArena::new();
    let mut types = TypeTable::new();
    let class = symbols.add(SymbolData::new(
        "C",
        DeclKind::Class {
            is_final: true,
            is_anonymous: false,
        },
    ));

    let first = types.class_type(class);
    let second = types.class_type(class);
    assert_eq!(first, second);
    assert_eq!(types.class_symbol(first), Some(class));
    assert!(!types.is_unit(first));
    assert!(types.is_unit(TypeId::UNIT));
    assert!(types.is_nothing(TypeId::NOTHING));
}

#[test]
fn friendly_modules_cover_friends_and_depends_on() {
    let mut modules = ModuleGraph::new();
    let app = modules.add_module("app");
    let lib = modules.add_module("lib");
    let common = modules.add_module("common");
    let stranger = modules.add_module("stranger");
    modules.add_friend(app, lib);
    modules.add_depends_on(app, common);

    let session = Session::new(modules, app);
    assert!(session.is_friendly_module(app));
    assert!(session.is_friendly_module(lib));
    assert!(session.is_friendly_module(common));
    assert!(!session.is_friendly_module(stranger));
}
