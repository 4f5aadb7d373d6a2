use kova_dfa::{RecordedFlow, Stability, TrivialFlow, VariableStorage};
use kova_tree::{
    DeclKind, ElementArena, ElementId, ModuleGraph, ModuleId, PropertyFacts, Session, SymbolArena,
    SymbolData, SymbolId, TypeId, TypeTable, Visibility,
};

const ALL_RANKS: [Stability; 7] = [
    Stability::StableValue,
    Stability::LocalVariable,
    Stability::ExpectProperty,
    Stability::PropertyWithGetter,
    Stability::AlienPublicProperty,
    Stability::MutableProperty,
    Stability::DelegatedProperty,
];

#[test]
fn combine_is_commutative_idempotent_and_monotone() {
    for &a in &ALL_RANKS {
        assert_eq!(a.combine(Some(a)), a);
        assert_eq!(a.combine(None), a);
        for &b in &ALL_RANKS {
            // The LocalVariable precondition rules out mixed pairs.
            let local = Stability::LocalVariable;
            if (a == local || b == local) && a.max(b) > local {
                continue;
            }
            assert_eq!(a.combine(Some(b)), b.combine(Some(a)));
            assert_eq!(a.combine(Some(b)), a.max(b));
            assert!(a.combine(Some(b)) >= a);
            assert!(a.combine(Some(b)) >= b);
        }
    }
}

#[test]
#[should_panic(expected = "cannot combine")]
fn combine_rejects_locals_under_unstable_ranks() {
    let _ = Stability::MutableProperty.combine(Some(Stability::LocalVariable));
}

struct Fixture {
    tree: ElementArena,
    symbols: SymbolArena,
    types: TypeTable,
    session: Session,
    lib: ModuleId,
    stranger: ModuleId,
}

impl Fixture {
    fn new() -> Fixture {
        let mut modules = ModuleGraph::new();
        let app = modules.add_module("app");
        let lib = modules.add_module("lib");
        let stranger = modules.add_module("stranger");
        modules.add_friend(app, lib);
        Fixture {
            tree: ElementArena::new(),
            symbols: SymbolArena::new(),
            types: TypeTable::new(),
            session: Session::new(modules, app),
            lib,
            stranger,
        }
    }

    fn stability_of(&mut self, symbol: SymbolId) -> Stability {
        let access = self
            .tree
            .add_access(symbol, ElementId::NONE, ElementId::NONE, TypeId::NONE);
        let mut storage = VariableStorage::new(&self.tree, &self.symbols, &self.types, &self.session);
        let variable = storage
            .get_or_create(&TrivialFlow, access, true)
            .as_real()
            .expect("symbol must have a real shape");
        storage.stability(variable)
    }
}

#[test]
fn stable_symbol_kinds() {
    let mut fx = Fixture::new();
    let enum_entry = fx.symbols.add(SymbolData::new("RED", DeclKind::EnumEntry));
    let parameter = fx
        .symbols
        .add(SymbolData::new("arg", DeclKind::ValueParameter));
    let error = fx
        .symbols
        .add(SymbolData::new("<error>", DeclKind::ErrorProperty));
    let object = fx.symbols.add(SymbolData::new(
        "Singleton",
        DeclKind::Class {
            is_final: true,
            is_anonymous: false,
        },
    ));

    assert_eq!(fx.stability_of(enum_entry), Stability::StableValue);
    assert_eq!(fx.stability_of(parameter), Stability::StableValue);
    assert_eq!(fx.stability_of(error), Stability::StableValue);
    assert_eq!(fx.stability_of(object), Stability::StableValue);
}

#[test]
fn backing_fields_follow_mutability() {
    let mut fx = Fixture::new();
    let val_field = fx
        .symbols
        .add(SymbolData::new("field", DeclKind::BackingField { is_val: true }));
    let var_field = fx
        .symbols
        .add(SymbolData::new("field", DeclKind::BackingField { is_val: false }));

    assert_eq!(fx.stability_of(val_field), Stability::StableValue);
    assert_eq!(fx.stability_of(var_field), Stability::MutableProperty);
}

#[test]
fn fields_check_finality_then_module() {
    let mut fx = Fixture::new();
    let lib = fx.lib;
    let stranger = fx.stranger;
    let open_field = fx
        .symbols
        .add(SymbolData::new("f", DeclKind::Field { is_final: false }));
    let friendly_field = fx
        .symbols
        .add(SymbolData::new("f", DeclKind::Field { is_final: true }).in_module(lib));
    let alien_field = fx
        .symbols
        .add(SymbolData::new("f", DeclKind::Field { is_final: true }).in_module(stranger));

    assert_eq!(fx.stability_of(open_field), Stability::MutableProperty);
    assert_eq!(fx.stability_of(friendly_field), Stability::StableValue);
    assert_eq!(fx.stability_of(alien_field), Stability::AlienPublicProperty);
}

#[test]
fn property_decision_table() {
    let mut fx = Fixture::new();
    let expect = fx.symbols.add(SymbolData::new(
        "e",
        DeclKind::Property(PropertyFacts {
            is_expect: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let delegated = fx.symbols.add(SymbolData::new(
        "d",
        DeclKind::Property(PropertyFacts {
            has_delegate: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let local = fx.symbols.add(SymbolData::new(
        "l",
        DeclKind::Property(PropertyFacts::local_val()),
    ));
    // Locals stay stable here even when reassignable; concurrent-reassignment
    // hazards are a use-site concern.
    let local_var = fx.symbols.add(SymbolData::new(
        "lv",
        DeclKind::Property(PropertyFacts {
            is_var: true,
            ..PropertyFacts::local_val()
        }),
    ));
    let member_var = fx.symbols.add(SymbolData::new(
        "m",
        DeclKind::Property(PropertyFacts {
            is_var: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let with_getter = fx.symbols.add(SymbolData::new(
        "g",
        DeclKind::Property(PropertyFacts {
            has_custom_getter: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let extension = fx.symbols.add(SymbolData::new(
        "x",
        DeclKind::Property(PropertyFacts {
            has_receiver_parameter: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let private = fx.symbols.add(SymbolData::new(
        "p",
        DeclKind::Property(PropertyFacts {
            visibility: Visibility::Private,
            has_custom_getter: false,
            ..PropertyFacts::member_val()
        }),
    ));

    assert_eq!(fx.stability_of(expect), Stability::ExpectProperty);
    assert_eq!(fx.stability_of(delegated), Stability::DelegatedProperty);
    assert_eq!(fx.stability_of(local), Stability::StableValue);
    assert_eq!(fx.stability_of(local_var), Stability::StableValue);
    assert_eq!(fx.stability_of(member_var), Stability::MutableProperty);
    assert_eq!(fx.stability_of(with_getter), Stability::PropertyWithGetter);
    assert_eq!(fx.stability_of(extension), Stability::PropertyWithGetter);
    assert_eq!(fx.stability_of(private), Stability::StableValue);
}

#[test]
fn public_members_depend_on_the_declaring_module() {
    let mut fx = Fixture::new();
    let lib = fx.lib;
    let stranger = fx.stranger;
    let friendly = fx.symbols.add(
        SymbolData::new("p", DeclKind::Property(PropertyFacts::member_val())).in_module(lib),
    );
    let alien = fx.symbols.add(
        SymbolData::new("p", DeclKind::Property(PropertyFacts::member_val())).in_module(stranger),
    );

    assert_eq!(fx.stability_of(friendly), Stability::StableValue);
    assert_eq!(fx.stability_of(alien), Stability::AlienPublicProperty);
}

fn open_property_through_receiver(receiver_final: bool) -> Stability {
    let mut fx = Fixture::new();
    let receiver_class = fx.symbols.add(SymbolData::new(
        if receiver_final { "FinalType" } else { "OpenType" },
        DeclKind::Class {
            is_final: receiver_final,
            is_anonymous: false,
        },
    ));
    let receiver_type = fx.types.class_type(receiver_class);
    let open_property = fx.symbols.add(SymbolData::new(
        "p",
        DeclKind::Property(PropertyFacts {
            is_final: false,
            ..PropertyFacts::member_val()
        }),
    ));
    let r = fx.symbols.add(
        SymbolData::new("r", DeclKind::Property(PropertyFacts::local_val())).typed(receiver_type),
    );
    let r_access = fx
        .tree
        .add_access(r, ElementId::NONE, ElementId::NONE, receiver_type);
    let p_access = fx
        .tree
        .add_access(open_property, r_access, ElementId::NONE, TypeId::NONE);

    let mut storage = VariableStorage::new(&fx.tree, &fx.symbols, &fx.types, &fx.session);
    let variable = storage
        .get_or_create(&TrivialFlow, p_access, true)
        .as_real()
        .expect("tracked receiver");
    storage.stability(variable)
}

#[test]
fn open_member_is_stable_only_through_a_final_receiver() {
    // An open val with a default getter may be overridden with a custom one
    // in a subclass; it is only as safe as knowing the receiver's exact
    // runtime class.
    assert_eq!(open_property_through_receiver(true), Stability::StableValue);
    assert_eq!(
        open_property_through_receiver(false),
        Stability::PropertyWithGetter
    );
}

#[test]
fn narrowed_receiver_type_restores_stability() {
    let mut fx = Fixture::new();
    let open_class = fx.symbols.add(SymbolData::new(
        "OpenType",
        DeclKind::Class {
            is_final: false,
            is_anonymous: false,
        },
    ));
    let final_class = fx.symbols.add(SymbolData::new(
        "FinalType",
        DeclKind::Class {
            is_final: true,
            is_anonymous: false,
        },
    ));
    let open_type = fx.types.class_type(open_class);
    let final_type = fx.types.class_type(final_class);
    let open_property = fx.symbols.add(SymbolData::new(
        "p",
        DeclKind::Property(PropertyFacts {
            is_final: false,
            ..PropertyFacts::member_val()
        }),
    ));
    let r = fx.symbols.add(
        SymbolData::new("r", DeclKind::Property(PropertyFacts::local_val())).typed(open_type),
    );
    let r_access = fx
        .tree
        .add_access(r, ElementId::NONE, ElementId::NONE, open_type);
    let p_access = fx
        .tree
        .add_access(open_property, r_access, ElementId::NONE, TypeId::NONE);

    let mut storage = VariableStorage::new(&fx.tree, &fx.symbols, &fx.types, &fx.session);
    let r_var = storage
        .get_or_create(&TrivialFlow, r_access, true)
        .as_real()
        .unwrap();
    // The flow has proven `r is FinalType` on this path.
    let mut flow = RecordedFlow::new();
    flow.add_narrowed_type(r_var, final_type);

    let variable = storage
        .get_or_create(&flow, p_access, true)
        .as_real()
        .unwrap();
    assert_eq!(storage.stability(variable), Stability::StableValue);
}

#[test]
fn receiver_instability_infects_the_member() {
    let mut fx = Fixture::new();
    let holder = fx.symbols.add(SymbolData::new(
        "holder",
        DeclKind::Property(PropertyFacts {
            is_var: true,
            ..PropertyFacts::member_val()
        }),
    ));
    let p = fx.symbols.add(SymbolData::new(
        "p",
        DeclKind::Property(PropertyFacts::member_val()),
    ));
    let holder_access = fx
        .tree
        .add_access(holder, ElementId::NONE, ElementId::NONE, TypeId::NONE);
    let p_access = fx
        .tree
        .add_access(p, holder_access, ElementId::NONE, TypeId::NONE);

    let mut storage = VariableStorage::new(&fx.tree, &fx.symbols, &fx.types, &fx.session);
    let variable = storage
        .get_or_create(&TrivialFlow, p_access, true)
        .as_real()
        .unwrap();

    // `p` itself is stable, but `holder` can be reassigned between the proof
    // and the reuse, so the chain is only as strong as its weakest link.
    assert_eq!(storage.stability(variable), Stability::MutableProperty);
}

#[test]
fn this_receiver_is_always_stable() {
    let mut fx = Fixture::new();
    let owner = fx.symbols.add(SymbolData::new(
        "Owner",
        DeclKind::Class {
            is_final: false,
            is_anonymous: false,
        },
    ));
    let this_access = fx.tree.add_this_access(owner, TypeId::NONE);

    let mut storage = VariableStorage::new(&fx.tree, &fx.symbols, &fx.types, &fx.session);
    let variable = storage
        .get_or_create(&TrivialFlow, this_access, true)
        .as_real()
        .unwrap();
    assert!(storage.real(variable).is_receiver);
    assert_eq!(storage.stability(variable), Stability::StableValue);
}
