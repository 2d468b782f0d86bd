//! Predicates are the caller-facing algebra: a closed set of atomic
//! facts about a rule's pregraph, postgraph and action, closed under
//! boolean connectives, graph scoping, and "the universe has a rule
//! such that...".
//!
//! A predicate tree is built bottom-up and never changes afterwards.
//! `compile` lowers it to a `Formula` under a `Binding`, and is pure
//! apart from minting fresh rule binders: compiling the same tree
//! twice yields two formulas that differ only in binder tags, and
//! never asserts anything.  The `Evaluator` owns the one assertion.
use crate::formula::{Atom, Formula, Rule};
use crate::intern::{Interner, Variable};
use crate::universe::{EffectKind, Side};
use std::fmt;
use std::sync::Arc;

/// Maps the rule bound by `model_has_rule` to the predicate it must
/// satisfy.
pub type RuleFn = Arc<dyn Fn(Rule) -> Predicate + Send + Sync>;

/// Which graph the graph-reading leaves examine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Lens {
    /// `Pre*` leaves read the pregraph, `Post*` leaves the postgraph.
    Natural,
    /// Every graph leaf reads the pregraph.
    Pregraph,
    /// Every graph leaf reads the postgraph.
    Postgraph,
}

/// The top-down context `compile` threads through a predicate tree.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Binding {
    pub rule: Rule,
    pub lens: Lens,
}

impl Binding {
    /// Leaves observe the ambient rule, each through its own graph.
    #[must_use]
    pub fn ambient() -> Self {
        Self {
            rule: Rule::ambient(),
            lens: Lens::Natural,
        }
    }

    fn side(self, natural: Side) -> Side {
        match self.lens {
            Lens::Natural => natural,
            Lens::Pregraph => Side::Pre,
            Lens::Postgraph => Side::Post,
        }
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::ambient()
    }
}

#[derive(Clone)]
pub enum Predicate {
    Top,
    Bottom,
    Equal(Variable, Variable),
    Labeled(Variable, String),
    PreParent(Variable, Variable),
    PostParent(Variable, Variable),
    DoParent(Variable, Variable),
    PreLink(Variable, Variable),
    PostLink(Variable, Variable),
    DoLink(Variable, Variable),
    DoUnlink(Variable, Variable),
    PreHas(Variable),
    PostHas(Variable),
    /// The node exists in the postgraph but not in the pregraph.
    Add(Variable),
    /// The node exists in the pregraph but not in the postgraph.
    Rem(Variable),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    PregraphHas(Rule, Box<Predicate>),
    PostgraphHas(Rule, Box<Predicate>),
    ModelHasRule(RuleFn),
}

impl Predicate {
    pub fn and(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::And(preds.into_iter().collect())
    }

    pub fn or(preds: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Or(preds.into_iter().collect())
    }

    #[must_use]
    pub fn not(pred: Predicate) -> Self {
        Predicate::Not(Box::new(pred))
    }

    pub fn labeled(x: Variable, label: impl Into<String>) -> Self {
        Predicate::Labeled(x, label.into())
    }

    /// Evaluates `structure` against `rule`'s pregraph.
    #[must_use]
    pub fn pregraph_has(rule: Rule, structure: Predicate) -> Self {
        Predicate::PregraphHas(rule, Box::new(structure))
    }

    /// Evaluates `structure` against `rule`'s postgraph.
    #[must_use]
    pub fn postgraph_has(rule: Rule, structure: Predicate) -> Self {
        Predicate::PostgraphHas(rule, Box::new(structure))
    }

    /// The universe has a rule `r` such that `rule_fn(r)` holds.
    ///
    /// For example, "some rule only needs `x` on its left-hand side":
    ///
    /// `Predicate::model_has_rule(move |r| Predicate::pregraph_has(r, Predicate::PreHas(x)))`
    pub fn model_has_rule<F>(rule_fn: F) -> Self
    where
        F: Fn(Rule) -> Predicate + Send + Sync + 'static,
    {
        Predicate::ModelHasRule(Arc::new(rule_fn))
    }

    /// Lowers this predicate to a formula under `binding`.  Only
    /// `ModelHasRule` touches `interner`, to mint a fresh binder.
    pub fn compile(&self, binding: Binding, interner: &mut Interner) -> Formula {
        use Predicate::*;

        match self {
            Top => Formula::Constant(true),
            Bottom => Formula::Constant(false),
            Equal(x, y) => Formula::SameTag(*x, *y),
            Labeled(x, label) => Formula::Atom(Atom::Labeled(*x, interner.label(label))),
            PreParent(x, y) => parents(binding, Side::Pre, *x, *y),
            PostParent(x, y) => parents(binding, Side::Post, *x, *y),
            DoParent(x, y) => performs(binding, EffectKind::Parent, *x, *y),
            PreLink(x, y) => links(binding, Side::Pre, *x, *y),
            PostLink(x, y) => links(binding, Side::Post, *x, *y),
            DoLink(x, y) => performs(binding, EffectKind::Link, *x, *y),
            DoUnlink(x, y) => performs(binding, EffectKind::Unlink, *x, *y),
            PreHas(x) => has(binding, Side::Pre, *x),
            PostHas(x) => has(binding, Side::Post, *x),
            Add(x) => Formula::And(vec![
                Formula::not(has(binding, Side::Pre, *x)),
                has(binding, Side::Post, *x),
            ]),
            Rem(x) => Formula::And(vec![
                has(binding, Side::Pre, *x),
                Formula::not(has(binding, Side::Post, *x)),
            ]),
            And(preds) => Formula::And(preds.iter().map(|p| p.compile(binding, interner)).collect()),
            Or(preds) => Formula::Or(preds.iter().map(|p| p.compile(binding, interner)).collect()),
            Not(pred) => Formula::not(pred.compile(binding, interner)),
            PregraphHas(rule, structure) => structure.compile(
                Binding {
                    rule: *rule,
                    lens: Lens::Pregraph,
                },
                interner,
            ),
            PostgraphHas(rule, structure) => structure.compile(
                Binding {
                    rule: *rule,
                    lens: Lens::Postgraph,
                },
                interner,
            ),
            ModelHasRule(rule_fn) => {
                // A new binder on every compile, so that two copies of
                // this node never capture each other's rule.
                let binder = interner.fresh_rule();
                let rule = Rule::bound(binder);
                let body = rule_fn(rule).compile(binding, interner);

                Formula::exists(
                    binder,
                    Formula::And(vec![Formula::Atom(Atom::InModel(rule)), body]),
                )
            }
        }
    }
}

fn has(binding: Binding, natural: Side, node: Variable) -> Formula {
    Formula::Atom(Atom::Has {
        rule: binding.rule,
        side: binding.side(natural),
        node,
    })
}

fn parents(binding: Binding, natural: Side, parent: Variable, child: Variable) -> Formula {
    Formula::Atom(Atom::Parents {
        rule: binding.rule,
        side: binding.side(natural),
        parent,
        child,
    })
}

fn links(binding: Binding, natural: Side, source: Variable, target: Variable) -> Formula {
    Formula::Atom(Atom::Links {
        rule: binding.rule,
        side: binding.side(natural),
        source,
        target,
    })
}

fn performs(binding: Binding, kind: EffectKind, source: Variable, target: Variable) -> Formula {
    Formula::Atom(Atom::Performs {
        rule: binding.rule,
        kind,
        source,
        target,
    })
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Predicate::*;

        match self {
            Top => f.write_str("Top"),
            Bottom => f.write_str("Bottom"),
            Equal(x, y) => f.debug_tuple("Equal").field(x).field(y).finish(),
            Labeled(x, label) => f.debug_tuple("Labeled").field(x).field(label).finish(),
            PreParent(x, y) => f.debug_tuple("PreParent").field(x).field(y).finish(),
            PostParent(x, y) => f.debug_tuple("PostParent").field(x).field(y).finish(),
            DoParent(x, y) => f.debug_tuple("DoParent").field(x).field(y).finish(),
            PreLink(x, y) => f.debug_tuple("PreLink").field(x).field(y).finish(),
            PostLink(x, y) => f.debug_tuple("PostLink").field(x).field(y).finish(),
            DoLink(x, y) => f.debug_tuple("DoLink").field(x).field(y).finish(),
            DoUnlink(x, y) => f.debug_tuple("DoUnlink").field(x).field(y).finish(),
            PreHas(x) => f.debug_tuple("PreHas").field(x).finish(),
            PostHas(x) => f.debug_tuple("PostHas").field(x).finish(),
            Add(x) => f.debug_tuple("Add").field(x).finish(),
            Rem(x) => f.debug_tuple("Rem").field(x).finish(),
            And(preds) => f.debug_tuple("And").field(preds).finish(),
            Or(preds) => f.debug_tuple("Or").field(preds).finish(),
            Not(pred) => f.debug_tuple("Not").field(pred).finish(),
            PregraphHas(rule, structure) => f
                .debug_tuple("PregraphHas")
                .field(rule)
                .field(structure)
                .finish(),
            PostgraphHas(rule, structure) => f
                .debug_tuple("PostgraphHas")
                .field(rule)
                .field(structure)
                .finish(),
            ModelHasRule(_) => f.write_str("ModelHasRule(..)"),
        }
    }
}

#[test]
fn test_compile_leaves() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();

    let compiled = Predicate::and(vec![
        Predicate::Top,
        Predicate::Equal(x, y),
        Predicate::PostParent(x, y),
        Predicate::DoUnlink(y, x),
    ])
    .compile(Binding::ambient(), &mut interner);

    assert_eq!(
        compiled,
        Formula::And(vec![
            Formula::Constant(true),
            Formula::SameTag(x, y),
            Formula::Atom(Atom::Parents {
                rule: Rule::ambient(),
                side: Side::Post,
                parent: x,
                child: y,
            }),
            Formula::Atom(Atom::Performs {
                rule: Rule::ambient(),
                kind: EffectKind::Unlink,
                source: y,
                target: x,
            }),
        ])
    );
}

#[test]
fn test_labeled_interns() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let compiled = Predicate::labeled(x, "kinase").compile(Binding::ambient(), &mut interner);
    let kinase = interner.label("kinase");
    assert_eq!(compiled, Formula::Atom(Atom::Labeled(x, kinase)));
}

#[test]
fn test_scoping_rebinds_graph() {
    use crate::universe::RuleId;

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let rule = Rule::concrete(RuleId(1));

    // Under a postgraph scope, even `PreHas` reads the postgraph, and
    // `Do*` leaves read the scoped rule's action.
    let compiled = Predicate::postgraph_has(
        rule,
        Predicate::and(vec![Predicate::PreHas(x), Predicate::DoLink(x, x)]),
    )
    .compile(Binding::ambient(), &mut interner);

    assert_eq!(
        compiled,
        Formula::And(vec![
            Formula::Atom(Atom::Has {
                rule,
                side: Side::Post,
                node: x,
            }),
            Formula::Atom(Atom::Performs {
                rule,
                kind: EffectKind::Link,
                source: x,
                target: x,
            }),
        ])
    );
}

#[test]
fn test_add_rem() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let pre = Formula::Atom(Atom::Has {
        rule: Rule::ambient(),
        side: Side::Pre,
        node: x,
    });
    let post = Formula::Atom(Atom::Has {
        rule: Rule::ambient(),
        side: Side::Post,
        node: x,
    });

    assert_eq!(
        Predicate::Add(x).compile(Binding::ambient(), &mut interner),
        Formula::And(vec![Formula::not(pre.clone()), post.clone()])
    );
    assert_eq!(
        Predicate::Rem(x).compile(Binding::ambient(), &mut interner),
        Formula::And(vec![pre, Formula::not(post)])
    );
}

#[test]
fn test_model_has_rule_fresh_binders() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let some_rule =
        Predicate::model_has_rule(move |r| Predicate::pregraph_has(r, Predicate::PreHas(x)));
    let twice = Predicate::and(vec![some_rule.clone(), some_rule.clone()]);

    let first = some_rule.compile(Binding::ambient(), &mut interner);
    let second = twice.compile(Binding::ambient(), &mut interner);

    let mut binders = first.binders();
    binders.extend(second.binders());
    assert_eq!(binders.len(), 3);
    binders.sort();
    binders.dedup();
    assert_eq!(binders.len(), 3);
}

#[test]
fn test_model_has_rule_shape() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let compiled = Predicate::model_has_rule(move |r| {
        Predicate::pregraph_has(r, Predicate::PreHas(x))
    })
    .compile(Binding::ambient(), &mut interner);

    match compiled {
        Formula::Exists(binder, body) => {
            let rule = Rule::bound(binder);
            assert_eq!(
                *body,
                Formula::And(vec![
                    Formula::Atom(Atom::InModel(rule)),
                    Formula::Atom(Atom::Has {
                        rule,
                        side: Side::Pre,
                        node: x,
                    }),
                ])
            );
        }
        other => panic!("expected an existential, got {}", other),
    }
}

#[test]
fn test_debug() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let pred = Predicate::not(Predicate::or(vec![
        Predicate::Rem(x),
        Predicate::model_has_rule(|_| Predicate::Bottom),
    ]));
    assert_eq!(
        format!("{:?}", pred),
        "Not(Or([Rem(Variable(0)), ModelHasRule(..)]))"
    );
}
