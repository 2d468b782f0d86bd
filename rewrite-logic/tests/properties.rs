use proptest::prelude::*;
use rewrite_logic::{
    Action, Effect, Error, Evaluator, Graph, Interner, Predicate, RewriteRule, Rule, RuleId,
    SolverOptions, Status, Universe, Variable,
};
use std::time::Duration;

fn status_of(universe: &Universe, interner: Interner, predicate: Predicate) -> Status {
    Evaluator::new(universe, interner, predicate)
        .check_sat()
        .expect("grounds")
}

/// One declared identifier per name, labeled by `label`.
fn declare_all(universe: &mut Universe, names: &[&str], label: &str) {
    for name in names {
        universe.declare(*name, label).expect("ok");
    }
}

fn single_rule(names: &[&str], rule: RewriteRule) -> Universe {
    let mut universe = Universe::new();
    declare_all(&mut universe, names, "node");
    universe.add_rule(rule).expect("ok");
    universe
}

/// Boolean skeletons whose leaves have a fixed truth value.
#[derive(Clone, Debug)]
enum Shape {
    Top,
    Bottom,
    SameVariable,
    DistinctVariables,
    And(Vec<Shape>),
    Or(Vec<Shape>),
    Not(Box<Shape>),
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        Just(Shape::Top),
        Just(Shape::Bottom),
        Just(Shape::SameVariable),
        Just(Shape::DistinctVariables),
    ];

    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Shape::And),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Shape::Or),
            inner.prop_map(|s| Shape::Not(Box::new(s))),
        ]
    })
}

fn truth(shape: &Shape) -> bool {
    match shape {
        Shape::Top | Shape::SameVariable => true,
        Shape::Bottom | Shape::DistinctVariables => false,
        Shape::And(parts) => parts.iter().all(truth),
        Shape::Or(parts) => parts.iter().any(truth),
        Shape::Not(inner) => !truth(inner),
    }
}

fn build(shape: &Shape, x: Variable, y: Variable) -> Predicate {
    match shape {
        Shape::Top => Predicate::Top,
        Shape::Bottom => Predicate::Bottom,
        Shape::SameVariable => Predicate::Equal(x, x),
        Shape::DistinctVariables => Predicate::Equal(x, y),
        Shape::And(parts) => Predicate::and(parts.iter().map(|p| build(p, x, y))),
        Shape::Or(parts) => Predicate::or(parts.iter().map(|p| build(p, x, y))),
        Shape::Not(inner) => Predicate::not(build(inner, x, y)),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn boolean_fragment_matches_direct_evaluation(tree in shape()) {
        let universe = Universe::new();
        let mut interner = Interner::new();
        let x = interner.fresh_variable();
        let y = interner.fresh_variable();

        let expected = if truth(&tree) { Status::Sat } else { Status::Unsat };
        let predicate = build(&tree, x, y);
        prop_assert_eq!(status_of(&universe, interner, predicate), expected);
    }
}

#[test]
fn equality_is_reflexive() {
    let empty = Universe::new();
    let populated = single_rule(
        &["a", "b"],
        RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new().with_node("b"),
            Action::new(),
        ),
    );

    for universe in &[empty, populated] {
        let mut interner = Interner::new();
        let x = interner.fresh_variable();
        assert_eq!(
            status_of(universe, interner, Predicate::Equal(x, x)),
            Status::Sat
        );

        let mut interner = Interner::new();
        let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
        let contradiction = Predicate::and(vec![
            Predicate::Equal(x, y),
            Predicate::not(Predicate::Equal(x, y)),
        ]);
        assert_eq!(status_of(universe, interner, contradiction), Status::Unsat);
    }
}

#[test]
fn removed_node_exists_only_before() {
    // The only node is removed by the action.
    let universe = single_rule(
        &["a"],
        RewriteRule::new(Graph::new().with_node("a"), Graph::new(), Action::new()),
    );

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let removed = Predicate::and(vec![
        Predicate::PreHas(x),
        Predicate::not(Predicate::PostHas(x)),
    ]);
    let mut evaluator = Evaluator::new(&universe, interner, removed);
    assert_eq!(evaluator.check_sat(), Ok(Status::Sat));
    assert_eq!(evaluator.model().expect("sat").get(x), Some("a"));

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    assert_eq!(status_of(&universe, interner, Predicate::Rem(x)), Status::Sat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    assert_eq!(status_of(&universe, interner, Predicate::Add(x)), Status::Unsat);
}

#[test]
fn disjoint_graphs_share_nothing() {
    let universe = single_rule(
        &["a", "b"],
        RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new().with_node("b"),
            Action::new(),
        ),
    );

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let kept = Predicate::and(vec![Predicate::PreHas(x), Predicate::PostHas(x)]);
    assert_eq!(status_of(&universe, interner, kept), Status::Unsat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let mut evaluator = Evaluator::new(&universe, interner, Predicate::Add(x));
    assert_eq!(evaluator.model().expect("sat").get(x), Some("b"));
}

#[test]
fn add_and_rem_are_empty_inside_a_graph_scope() {
    let universe = single_rule(
        &["a", "b"],
        RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new().with_node("b"),
            Action::new(),
        ),
    );

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let added_before = Predicate::pregraph_has(Rule::ambient(), Predicate::Add(x));
    assert_eq!(status_of(&universe, interner, added_before), Status::Unsat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let removed_after = Predicate::postgraph_has(Rule::ambient(), Predicate::Rem(x));
    assert_eq!(status_of(&universe, interner, removed_after), Status::Unsat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    assert_eq!(
        status_of(&universe, interner, Predicate::Add(x)),
        Status::Sat
    );
}

#[test]
fn do_link_needs_a_link_effect() {
    let graph = Graph::new().with_node("a").with_node("b");

    let idle = single_rule(
        &["a", "b"],
        RewriteRule::new(graph.clone(), graph.clone(), Action::new()),
    );
    let mut interner = Interner::new();
    let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
    assert_eq!(
        status_of(&idle, interner, Predicate::DoLink(x, y)),
        Status::Unsat
    );

    let linking = single_rule(
        &["a", "b"],
        RewriteRule::new(
            graph.clone(),
            graph.with_link("a", "b"),
            Action::new().with_effect(Effect::link("a", "b")),
        ),
    );
    let mut interner = Interner::new();
    let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
    let mut evaluator = Evaluator::new(&linking, interner, Predicate::DoLink(x, y));
    let witness = evaluator.model().expect("sat");
    assert_eq!(witness.get(x), Some("a"));
    assert_eq!(witness.get(y), Some("b"));

    // A link effect is neither an unlink nor a parent effect.
    let mut interner = Interner::new();
    let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
    let other_effects = Predicate::or(vec![Predicate::DoUnlink(x, y), Predicate::DoParent(x, y)]);
    assert_eq!(status_of(&linking, interner, other_effects), Status::Unsat);

    // And the direction matters.
    let mut interner = Interner::new();
    let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
    let backwards = Predicate::and(vec![
        Predicate::DoLink(x, y),
        Predicate::labeled(x, "node"),
        Predicate::PostLink(y, x),
    ]);
    assert_eq!(status_of(&linking, interner, backwards), Status::Unsat);
}

#[test]
fn parent_edges_before_and_after() {
    let mut universe = Universe::new();
    universe.declare("mek", "kinase").expect("ok");
    universe.declare("erk", "kinase").expect("ok");
    universe.declare("p", "phosphate").expect("ok");
    universe
        .add_rule(RewriteRule::new(
            Graph::new().with_node("mek").with_node("erk").with_node("p"),
            Graph::new()
                .with_node("mek")
                .with_node("erk")
                .with_node("p")
                .with_parent("erk", "p"),
            Action::new().with_effect(Effect::parent("erk", "p")),
        ))
        .expect("ok");

    let mut interner = Interner::new();
    let (x, y) = (interner.fresh_variable(), interner.fresh_variable());
    let gained_parent = Predicate::and(vec![
        Predicate::not(Predicate::PreParent(x, y)),
        Predicate::PostParent(x, y),
        Predicate::DoParent(x, y),
        Predicate::labeled(x, "kinase"),
        Predicate::labeled(y, "phosphate"),
    ]);
    let mut evaluator = Evaluator::new(&universe, interner, gained_parent);
    let witness = evaluator.model().expect("sat");
    assert_eq!(witness.get(x), Some("erk"));
    assert_eq!(witness.get(y), Some("p"));

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let unknown_label = Predicate::labeled(x, "scaffold");
    assert_eq!(status_of(&universe, interner, unknown_label), Status::Unsat);
}

fn rule_universe(pregraphs: &[&[&str]]) -> Universe {
    let mut universe = Universe::new();
    declare_all(&mut universe, &["a", "b"], "node");
    for nodes in pregraphs {
        let pregraph = nodes
            .iter()
            .fold(Graph::new(), |graph, name| graph.with_node(*name));
        universe
            .add_rule(RewriteRule::new(pregraph, Graph::new(), Action::new()))
            .expect("ok");
    }
    universe
}

fn some_nonempty_pregraph(x: Variable) -> Predicate {
    Predicate::model_has_rule(move |r| Predicate::pregraph_has(r, Predicate::PreHas(x)))
}

#[test]
fn model_has_rule_finds_nonempty_pregraph() {
    let cases = vec![
        (rule_universe(&[]), Status::Unsat),
        (rule_universe(&[&[]]), Status::Unsat),
        (rule_universe(&[&[], &[]]), Status::Unsat),
        (rule_universe(&[&[], &["b"]]), Status::Sat),
        (rule_universe(&[&["a", "b"]]), Status::Sat),
    ];

    for (index, (universe, expected)) in cases.iter().enumerate() {
        let mut interner = Interner::new();
        let x = interner.fresh_variable();
        assert_eq!(
            status_of(universe, interner, some_nonempty_pregraph(x)),
            *expected,
            "case {}",
            index
        );
    }
}

#[test]
fn model_has_rule_compiles_twice_without_capture() {
    let universes = vec![rule_universe(&[&[]]), rule_universe(&[&[], &["a"]])];

    for universe in &universes {
        let mut interner = Interner::new();
        let x = interner.fresh_variable();
        let once = status_of(universe, interner, some_nonempty_pregraph(x));

        let mut interner = Interner::new();
        let x = interner.fresh_variable();
        let quantified = some_nonempty_pregraph(x);
        let twice = Predicate::and(vec![quantified.clone(), quantified]);
        let mut evaluator = Evaluator::new(universe, interner, twice);

        assert_eq!(evaluator.check_sat(), Ok(once));
        let binders = evaluator.formula().expect("compiled").binders();
        assert_eq!(binders.len(), 2);
        assert_ne!(binders[0], binders[1]);
    }
}

#[test]
fn nested_quantifiers_see_outer_rule() {
    // Some rule removes a node that another (or the same) rule adds.
    let mut universe = Universe::new();
    declare_all(&mut universe, &["a", "b"], "node");
    universe
        .add_rule(RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new(),
            Action::new(),
        ))
        .expect("ok");
    universe
        .add_rule(RewriteRule::new(
            Graph::new(),
            Graph::new().with_node("a"),
            Action::new(),
        ))
        .expect("ok");

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let remove_then_add = Predicate::model_has_rule(move |r| {
        Predicate::and(vec![
            Predicate::pregraph_has(r, Predicate::PreHas(x)),
            Predicate::not(Predicate::postgraph_has(r, Predicate::PostHas(x))),
            Predicate::model_has_rule(move |s| {
                Predicate::and(vec![
                    Predicate::not(Predicate::pregraph_has(s, Predicate::PreHas(x))),
                    Predicate::postgraph_has(s, Predicate::PostHas(x)),
                ])
            }),
        ])
    });

    let mut evaluator = Evaluator::new(&universe, interner, remove_then_add);
    assert_eq!(evaluator.model().expect("sat").get(x), Some("a"));

    // "Every rule keeps `x` in its pregraph" fails: rule #1 has none.
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let every_rule = Predicate::not(Predicate::model_has_rule(move |r| {
        Predicate::not(Predicate::pregraph_has(r, Predicate::PreHas(x)))
    }));
    assert_eq!(status_of(&universe, interner, every_rule), Status::Unsat);
}

#[test]
fn concrete_rule_scope() {
    let mut universe = rule_universe(&[&[], &["b"]]);
    universe.set_ambient(RuleId(0)).expect("ok");

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let second = Predicate::pregraph_has(Rule::concrete(RuleId(1)), Predicate::PreHas(x));
    let mut evaluator = Evaluator::new(&universe, interner, second);
    assert_eq!(evaluator.model().expect("sat").get(x), Some("b"));

    // The ambient rule #0 has an empty pregraph.
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    assert_eq!(
        status_of(&universe, interner, Predicate::PreHas(x)),
        Status::Unsat
    );

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let missing = Predicate::pregraph_has(Rule::concrete(RuleId(4)), Predicate::PreHas(x));
    let mut evaluator = Evaluator::new(&universe, interner, missing);
    assert_eq!(evaluator.check_sat(), Err(Error::UnknownRule(4)));
}

#[test]
fn escaped_rule_is_rejected() {
    use std::sync::{Arc, Mutex};

    let universe = rule_universe(&[&["a"]]);
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    // Smuggle the bound rule out of its quantifier.
    let leaked: Arc<Mutex<Option<Rule>>> = Arc::new(Mutex::new(None));
    let sink = leaked.clone();
    let quantified = Predicate::model_has_rule(move |r| {
        *sink.lock().expect("lock") = Some(r);
        Predicate::Top
    });
    let _ = Evaluator::new(&universe, Interner::new(), quantified).check_sat();

    let escaped = leaked.lock().expect("lock").expect("compiled");
    let outside = Predicate::pregraph_has(escaped, Predicate::PreHas(x));
    let mut evaluator = Evaluator::new(&universe, interner, outside);
    assert!(matches!(evaluator.check_sat(), Err(Error::UnboundRule(_))));
}

#[test]
fn model_unavailable_on_unsat() {
    let universe = rule_universe(&[&["a"]]);
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let mut evaluator = Evaluator::new(&universe, interner, Predicate::PostHas(x));
    assert_eq!(evaluator.check_sat(), Ok(Status::Unsat));
    assert_eq!(
        evaluator.model(),
        Err(Error::ModelUnavailable {
            status: Status::Unsat
        })
    );
}

#[test]
fn generous_time_limit_still_decides() {
    let universe = rule_universe(&[&["a", "b"]]);
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let options = SolverOptions {
        max_time: Some(Duration::from_secs(60)),
        threads: 1,
    };
    let mut evaluator =
        Evaluator::with_options(&universe, interner, Predicate::PreHas(x), options);
    assert_eq!(evaluator.check_sat(), Ok(Status::Sat));
}

#[test]
fn undeclared_universe_still_has_a_domain() {
    // One rule, but no identifiers: x denotes a stand-in that no graph
    // mentions, so excluded middle and `not PreHas(x)` both hold.
    let mut universe = Universe::new();
    universe.add_rule(RewriteRule::default()).expect("ok");

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let either = Predicate::or(vec![
        Predicate::PreHas(x),
        Predicate::not(Predicate::PreHas(x)),
    ]);
    assert_eq!(status_of(&universe, interner, either), Status::Sat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let absent = Predicate::not(Predicate::PreHas(x));
    assert_eq!(status_of(&universe, interner, absent), Status::Sat);

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let present = Predicate::PreHas(x);
    assert_eq!(status_of(&universe, interner, present), Status::Unsat);
}

#[test]
fn model_binds_unconstrained_variables() {
    let universe = single_rule(
        &["a", "b"],
        RewriteRule::new(
            Graph::new().with_node("a"),
            Graph::new().with_node("b"),
            Action::new(),
        ),
    );

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let mut evaluator = Evaluator::new(&universe, interner, Predicate::Equal(x, x));
    assert_eq!(evaluator.check_sat().expect("grounds"), Status::Sat);
    assert!(evaluator.model().expect("sat").get(x).is_some());
}
