//! Grounding turns a first-order formula over the universe into a
//! propositional circuit.
//!
//! The interpretation becomes one `Selector` per (variable,
//! identifier) pair, with exactly one selector true per variable.
//! Atoms become disjunctions over the facts that could satisfy them,
//! and `Exists` over rules becomes a disjunction over the universe's
//! rules with the binder substituted.  Selectors are only allocated
//! for variables whose interpretation some atom reads.
//!
//! The identifier domain is never empty: a universe that declares no
//! identifiers gets one anonymous identifier, with no label, that sits
//! in no graph and no effect.
use super::{Oracle, Witness};
use crate::formula::{Atom, Formula, Rule, RuleTerm};
use crate::intern::{Identifier, Interner, Label, RuleBinder, Variable};
use crate::universe::{RewriteRule, RuleId, Universe};
use crate::{Error, SolverOptions, Status};
use circuit_sat::{Circuit, Lit, Proposition};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// "`variable` denotes `identifier`".
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Selector {
    pub variable: Variable,
    pub identifier: Identifier,
}

impl Proposition for Selector {}

struct DomainEntry<'u> {
    name: &'u str,
    identifier: Identifier,
    label: Option<Label>,
}

/// Name of the stand-in identifier of an identifier-less universe.
const ANONYMOUS: &str = "_";

/// Rule binders in scope, innermost last.
type Env = Vec<(RuleBinder, RuleId)>;

pub struct SatOracle<'u> {
    universe: &'u Universe,
    circuit: Circuit<Selector>,
    // Interned on the first assertion, in the universe's name order.
    domain: Option<Vec<DomainEntry<'u>>>,
    positions: HashMap<&'u str, usize>,
    selectors: BTreeMap<Variable, Vec<Lit>>,
    status: Option<Status>,
}

impl<'u> SatOracle<'u> {
    #[must_use]
    pub fn new(universe: &'u Universe) -> Self {
        Self::with_options(universe, SolverOptions::default())
    }

    #[must_use]
    pub fn with_options(universe: &'u Universe, options: SolverOptions) -> Self {
        Self {
            universe,
            circuit: Circuit::with_options(options),
            domain: None,
            positions: HashMap::new(),
            selectors: BTreeMap::new(),
            status: None,
        }
    }

    fn ensure_domain(&mut self, interner: &mut Interner) {
        if self.domain.is_some() {
            return;
        }

        let universe = self.universe;
        let mut domain: Vec<DomainEntry<'u>> = universe
            .identifiers()
            .map(|(name, label)| DomainEntry {
                name,
                identifier: interner.identifier(name),
                label: Some(interner.label(label)),
            })
            .collect();

        self.positions = domain
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.name, index))
            .collect();

        if domain.is_empty() {
            // Kept out of `positions`: no graph or effect names it.
            domain.push(DomainEntry {
                name: ANONYMOUS,
                identifier: interner.identifier(ANONYMOUS),
                label: None,
            });
        }

        self.domain = Some(domain);
    }

    fn domain(&self) -> &[DomainEntry<'u>] {
        self.domain.as_deref().unwrap_or(&[])
    }

    fn position(&self, name: &str) -> Result<usize, Error> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownIdentifier(name.to_string()))
    }

    /// Returns `variable`'s selectors, one per domain entry, declaring
    /// them (and their exactly-one constraint) on first use.
    fn selectors(&mut self, variable: Variable) -> Vec<Lit> {
        if let Some(lits) = self.selectors.get(&variable) {
            return lits.clone();
        }

        let identifiers: Vec<Identifier> = self.domain().iter().map(|e| e.identifier).collect();
        let lits: Vec<Lit> = identifiers
            .into_iter()
            .map(|identifier| {
                self.circuit.proposition(Selector {
                    variable,
                    identifier,
                })
            })
            .collect();

        self.circuit.exactly_one(&lits);
        self.selectors.insert(variable, lits.clone());
        lits
    }

    fn resolve(&self, rule: Rule, env: &[(RuleBinder, RuleId)]) -> Result<RuleId, Error> {
        match rule.0 {
            RuleTerm::Ambient => self.universe.ambient().ok_or(Error::NoAmbientRule),
            RuleTerm::Concrete(id) => match self.universe.rule(id) {
                Some(_) => Ok(id),
                None => Err(Error::UnknownRule(id.0)),
            },
            RuleTerm::Bound(binder) => env
                .iter()
                .rev()
                .find(|(bound, _)| *bound == binder)
                .map(|(_, id)| *id)
                .ok_or_else(|| Error::UnboundRule(binder.to_string())),
        }
    }

    fn rewrite(&self, rule: Rule, env: &[(RuleBinder, RuleId)]) -> Result<&'u RewriteRule, Error> {
        let id = self.resolve(rule, env)?;
        let universe = self.universe;
        universe.rule(id).ok_or(Error::UnknownRule(id.0))
    }

    fn ground(&mut self, formula: &Formula, env: &mut Env) -> Result<Lit, Error> {
        match formula {
            Formula::Constant(value) => Ok(self.circuit.constant(*value)),
            Formula::SameTag(x, y) => Ok(self.circuit.constant(x.tag() == y.tag())),
            Formula::Atom(atom) => self.ground_atom(atom, env),
            Formula::Not(inner) => Ok(Circuit::<Selector>::negate(self.ground(inner, env)?)),
            Formula::And(parts) => {
                let lits = self.ground_all(parts, env)?;
                Ok(self.circuit.and(&lits))
            }
            Formula::Or(parts) => {
                let lits = self.ground_all(parts, env)?;
                Ok(self.circuit.or(&lits))
            }
            Formula::Exists(binder, body) => {
                let rules: Vec<RuleId> = self.universe.rule_ids().collect();
                trace!(%binder, rules = rules.len(), "expanding rule quantifier");

                let mut disjuncts = Vec::with_capacity(rules.len());
                for rule in rules {
                    env.push((*binder, rule));
                    let lit = self.ground(body, env);
                    env.pop();
                    disjuncts.push(lit?);
                }

                Ok(self.circuit.or(&disjuncts))
            }
        }
    }

    fn ground_all(&mut self, parts: &[Formula], env: &mut Env) -> Result<Vec<Lit>, Error> {
        parts.iter().map(|part| self.ground(part, env)).collect()
    }

    fn ground_atom(&mut self, atom: &Atom, env: &[(RuleBinder, RuleId)]) -> Result<Lit, Error> {
        match atom {
            Atom::InModel(rule) => {
                let present = match rule.0 {
                    RuleTerm::Ambient => self.universe.ambient().is_some(),
                    RuleTerm::Concrete(id) => self.universe.rule(id).is_some(),
                    // Quantifiers only range over the universe's rules.
                    RuleTerm::Bound(_) => {
                        self.resolve(*rule, env)?;
                        true
                    }
                };

                Ok(self.circuit.constant(present))
            }
            Atom::Labeled(x, label) => {
                let choices = self.selectors(*x);
                let matching: Vec<Lit> = self
                    .domain()
                    .iter()
                    .zip(choices)
                    .filter(|(entry, _)| entry.label == Some(*label))
                    .map(|(_, lit)| lit)
                    .collect();

                Ok(self.circuit.or(&matching))
            }
            Atom::Has { rule, side, node } => {
                let graph = self.rewrite(*rule, env)?.graph(*side);
                let choices = self.selectors(*node);
                let lits = graph
                    .nodes
                    .iter()
                    .map(|name| -> Result<Lit, Error> { Ok(choices[self.position(name)?]) })
                    .collect::<Result<Vec<Lit>, Error>>()?;

                Ok(self.circuit.or(&lits))
            }
            Atom::Parents {
                rule,
                side,
                parent,
                child,
            } => {
                let graph = self.rewrite(*rule, env)?.graph(*side);
                self.ground_pairs(graph.parents.iter().map(|(a, b)| (a, b)), *parent, *child)
            }
            Atom::Links {
                rule,
                side,
                source,
                target,
            } => {
                let graph = self.rewrite(*rule, env)?.graph(*side);
                self.ground_pairs(graph.links.iter().map(|(a, b)| (a, b)), *source, *target)
            }
            Atom::Performs {
                rule,
                kind,
                source,
                target,
            } => {
                let action = &self.rewrite(*rule, env)?.action;
                let facts = action
                    .effects
                    .iter()
                    .filter(|effect| effect.kind == *kind)
                    .map(|effect| (&effect.source, &effect.target));
                self.ground_pairs(facts, *source, *target)
            }
        }
    }

    /// Some fact `(a, b)` in `facts` has `x` denoting `a` and `y`
    /// denoting `b`.
    fn ground_pairs<'a>(
        &mut self,
        facts: impl Iterator<Item = (&'a String, &'a String)>,
        x: Variable,
        y: Variable,
    ) -> Result<Lit, Error> {
        let xs = self.selectors(x);
        let ys = self.selectors(y);

        let mut disjuncts = Vec::new();
        for (a, b) in facts {
            let both = [xs[self.position(a)?], ys[self.position(b)?]];
            disjuncts.push(self.circuit.and(&both));
        }

        Ok(self.circuit.or(&disjuncts))
    }
}

impl<'u> Oracle for SatOracle<'u> {
    fn assert(&mut self, formula: &Formula, interner: &mut Interner) -> Result<(), Error> {
        self.ensure_domain(interner);

        let root = self.ground(formula, &mut Vec::new())?;
        self.circuit.require(root);

        debug!(
            identifiers = self.domain().len(),
            variables = self.selectors.len(),
            gates = self.circuit.num_gates(),
            "grounded formula"
        );
        Ok(())
    }

    fn check(&mut self) -> Status {
        let status = self.circuit.solve();
        self.status = Some(status);
        status
    }

    /// Binds every variable `interner` minted.  Variables no atom
    /// observed are unconstrained, and denote the first identifier.
    fn witness(&self, interner: &Interner) -> Option<Witness> {
        if self.status != Some(Status::Sat) {
            return None;
        }

        let mut witness = Witness::new();
        for variable in interner.variables() {
            let chosen = match self.selectors.get(&variable) {
                Some(_) => self.domain().iter().find(|entry| {
                    self.circuit.value(&Selector {
                        variable,
                        identifier: entry.identifier,
                    }) == Some(true)
                })?,
                None => self.domain().first()?,
            };
            witness.bind(variable, interner.identifier_name(chosen.identifier));
        }

        Some(witness)
    }
}

#[cfg(test)]
fn two_node_universe() -> Universe {
    use crate::universe::{Action, Effect, Graph};

    let mut universe = Universe::new();
    universe.declare("a", "kinase").expect("ok");
    universe.declare("b", "substrate").expect("ok");
    universe
        .add_rule(RewriteRule::new(
            Graph::new().with_node("a").with_node("b"),
            Graph::new().with_node("a").with_node("b").with_link("a", "b"),
            Action::new().with_effect(Effect::link("a", "b")),
        ))
        .expect("ok");
    universe
}

#[test]
fn test_witness_follows_labels() {
    let universe = two_node_universe();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let kinase = interner.label("kinase");

    let mut oracle = SatOracle::new(&universe);
    oracle
        .assert(&Formula::Atom(Atom::Labeled(x, kinase)), &mut interner)
        .expect("ok");

    assert_eq!(oracle.check(), Status::Sat);
    let witness = oracle.witness(&interner).expect("sat");
    assert_eq!(witness.get(x), Some("a"));
}

#[test]
fn test_witness_follows_links() {
    use crate::universe::Side;

    let universe = two_node_universe();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();

    let mut oracle = SatOracle::new(&universe);
    let post_link = Formula::Atom(Atom::Links {
        rule: Rule::ambient(),
        side: Side::Post,
        source: x,
        target: y,
    });
    oracle.assert(&post_link, &mut interner).expect("ok");

    assert_eq!(oracle.check(), Status::Sat);
    let witness = oracle.witness(&interner).expect("sat");
    assert_eq!(witness.get(x), Some("a"));
    assert_eq!(witness.get(y), Some("b"));
}

#[test]
fn test_witness_binds_unobserved_variables() {
    let universe = two_node_universe();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();

    let mut oracle = SatOracle::new(&universe);
    oracle
        .assert(&Formula::SameTag(x, x), &mut interner)
        .expect("ok");

    assert_eq!(oracle.check(), Status::Sat);
    let witness = oracle.witness(&interner).expect("sat");
    assert_eq!(witness.len(), 2);
    assert_eq!(witness.get(x), Some("a"));
    assert_eq!(witness.get(y), Some("a"));
}

#[test]
fn test_anonymous_identifier() {
    use crate::universe::Side;

    // One rule, nothing declared: `x` can only denote the stand-in,
    // which no graph has and no label describes.
    let mut universe = Universe::new();
    universe.add_rule(RewriteRule::default()).expect("ok");
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let node = interner.label("node");

    let pre_has = Formula::Atom(Atom::Has {
        rule: Rule::ambient(),
        side: Side::Pre,
        node: x,
    });
    let mut oracle = SatOracle::new(&universe);
    oracle
        .assert(
            &Formula::And(vec![
                Formula::not(pre_has),
                Formula::not(Formula::Atom(Atom::Labeled(x, node))),
            ]),
            &mut interner,
        )
        .expect("ok");

    assert_eq!(oracle.check(), Status::Sat);
    let witness = oracle.witness(&interner).expect("sat");
    assert_eq!(witness.get(x), Some(ANONYMOUS));
}

#[test]
fn test_no_witness_when_unsat() {
    let universe = two_node_universe();
    let mut interner = Interner::new();

    let mut oracle = SatOracle::new(&universe);
    oracle
        .assert(&Formula::Constant(false), &mut interner)
        .expect("ok");

    assert_eq!(oracle.check(), Status::Unsat);
    assert_eq!(oracle.witness(&interner), None);
}

#[test]
fn test_unbound_rule() {
    use crate::universe::Side;

    let universe = two_node_universe();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let escaped = interner.fresh_rule();

    let mut oracle = SatOracle::new(&universe);
    let formula = Formula::Atom(Atom::Has {
        rule: Rule::bound(escaped),
        side: Side::Pre,
        node: x,
    });

    assert_eq!(
        oracle.assert(&formula, &mut interner),
        Err(Error::UnboundRule("?r0".into()))
    );
}

#[test]
fn test_no_ambient_rule() {
    use crate::universe::Side;

    let universe = Universe::new();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let mut oracle = SatOracle::new(&universe);
    let formula = Formula::Atom(Atom::Has {
        rule: Rule::ambient(),
        side: Side::Post,
        node: x,
    });

    assert_eq!(
        oracle.assert(&formula, &mut interner),
        Err(Error::NoAmbientRule)
    );
}

#[test]
fn test_unknown_concrete_rule() {
    let universe = two_node_universe();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();

    let mut oracle = SatOracle::new(&universe);
    let formula = Formula::Atom(Atom::Performs {
        rule: Rule::concrete(RuleId(5)),
        kind: crate::universe::EffectKind::Link,
        source: x,
        target: y,
    });

    assert_eq!(
        oracle.assert(&formula, &mut interner),
        Err(Error::UnknownRule(5))
    );
}

#[test]
fn test_in_model_of_missing_rule_is_false() {
    let universe = two_node_universe();
    let mut interner = Interner::new();

    let mut oracle = SatOracle::new(&universe);
    oracle
        .assert(
            &Formula::Atom(Atom::InModel(Rule::concrete(RuleId(9)))),
            &mut interner,
        )
        .expect("ok");

    assert_eq!(oracle.check(), Status::Unsat);
}
