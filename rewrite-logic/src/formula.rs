//! The formula language predicates compile to: boolean connectives
//! and existential quantification over rules, on top of atoms that
//! read the universe's relations through the interpretation.
//!
//! Formulas are plain values.  Building one never touches a solver;
//! only an `Oracle` gives them meaning.
use crate::intern::{Label, RuleBinder, Variable};
use crate::universe::{EffectKind, RuleId, Side};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum RuleTerm {
    /// The universe's designated rule.
    Ambient,
    Concrete(RuleId),
    /// A rule bound by an enclosing `Exists`.
    Bound(RuleBinder),
}

/// A reference to a rule, as seen from inside a formula.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rule(pub(crate) RuleTerm);

impl Rule {
    #[must_use]
    pub fn ambient() -> Self {
        Self(RuleTerm::Ambient)
    }

    #[must_use]
    pub fn concrete(id: RuleId) -> Self {
        Self(RuleTerm::Concrete(id))
    }

    pub(crate) fn bound(binder: RuleBinder) -> Self {
        Self(RuleTerm::Bound(binder))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RuleTerm::Ambient => f.write_str("ambient"),
            RuleTerm::Concrete(id) => write!(f, "#{}", id.0),
            RuleTerm::Bound(binder) => write!(f, "{}", binder),
        }
    }
}

/// Atoms are the only way a formula observes the universe.  Every
/// variable argument stands for `interpretation(variable)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Atom {
    /// The universe contains `rule`.
    InModel(Rule),
    Labeled(Variable, Label),
    Has {
        rule: Rule,
        side: Side,
        node: Variable,
    },
    Parents {
        rule: Rule,
        side: Side,
        parent: Variable,
        child: Variable,
    },
    Links {
        rule: Rule,
        side: Side,
        source: Variable,
        target: Variable,
    },
    /// The rule's action has the effect `kind(source, target)`.
    Performs {
        rule: Rule,
        kind: EffectKind,
        source: Variable,
        target: Variable,
    },
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Formula {
    Constant(bool),
    /// The two variables carry the same tag.
    SameTag(Variable, Variable),
    Atom(Atom),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Exists(RuleBinder, Box<Formula>),
}

impl Formula {
    #[must_use]
    pub fn not(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    #[must_use]
    pub fn exists(binder: RuleBinder, body: Formula) -> Self {
        Formula::Exists(binder, Box::new(body))
    }

    /// Number of nodes in the formula tree.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Formula::Constant(_) | Formula::SameTag(..) | Formula::Atom(_) => 1,
            Formula::Not(inner) | Formula::Exists(_, inner) => 1 + inner.size(),
            Formula::And(parts) | Formula::Or(parts) => {
                1 + parts.iter().map(Formula::size).sum::<usize>()
            }
        }
    }

    /// Binders introduced by `Exists` nodes, in pre-order.
    #[must_use]
    pub fn binders(&self) -> Vec<RuleBinder> {
        let mut ret = Vec::new();
        self.collect_binders(&mut ret);
        ret
    }

    fn collect_binders(&self, acc: &mut Vec<RuleBinder>) {
        match self {
            Formula::Constant(_) | Formula::SameTag(..) | Formula::Atom(_) => {}
            Formula::Not(inner) => inner.collect_binders(acc),
            Formula::Exists(binder, inner) => {
                acc.push(*binder);
                inner.collect_binders(acc);
            }
            Formula::And(parts) | Formula::Or(parts) => {
                for part in parts {
                    part.collect_binders(acc);
                }
            }
        }
    }
}

/// Prints a variable by tag.  Tags stay inside formula dumps.
struct Tag(Variable);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?x{}", self.0.tag())
    }
}

fn side_prefix(side: Side) -> &'static str {
    match side {
        Side::Pre => "pre",
        Side::Post => "post",
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::InModel(rule) => write!(f, "(model {})", rule),
            // Labels print by key; the oracle owns the names.
            Atom::Labeled(x, label) => write!(f, "(labeled {} {:?})", Tag(*x), label),
            Atom::Has { rule, side, node } => {
                write!(f, "({}-has {} {})", side_prefix(*side), rule, Tag(*node))
            }
            Atom::Parents {
                rule,
                side,
                parent,
                child,
            } => write!(
                f,
                "({}-parents {} {} {})",
                side_prefix(*side),
                rule,
                Tag(*parent),
                Tag(*child)
            ),
            Atom::Links {
                rule,
                side,
                source,
                target,
            } => write!(
                f,
                "({}-links {} {} {})",
                side_prefix(*side),
                rule,
                Tag(*source),
                Tag(*target)
            ),
            Atom::Performs {
                rule,
                kind,
                source,
                target,
            } => {
                let effect = match kind {
                    EffectKind::Parent => "parent",
                    EffectKind::Link => "link",
                    EffectKind::Unlink => "unlink",
                };
                write!(f, "(do-{} {} {} {})", effect, rule, Tag(*source), Tag(*target))
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, head: &str, parts: &[Formula]) -> fmt::Result {
            write!(f, "({}", head)?;
            for part in parts {
                write!(f, " {}", part)?;
            }
            f.write_str(")")
        }

        match self {
            Formula::Constant(value) => write!(f, "{}", value),
            Formula::SameTag(x, y) => write!(f, "(= {} {})", Tag(*x), Tag(*y)),
            Formula::Atom(atom) => write!(f, "{}", atom),
            Formula::Not(inner) => write!(f, "(not {})", inner),
            Formula::And(parts) => list(f, "and", parts),
            Formula::Or(parts) => list(f, "or", parts),
            Formula::Exists(binder, body) => write!(f, "(exists {} {})", binder, body),
        }
    }
}

#[test]
fn test_display() {
    use crate::Interner;

    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();
    let r = interner.fresh_rule();

    let formula = Formula::exists(
        r,
        Formula::And(vec![
            Formula::Atom(Atom::InModel(Rule::bound(r))),
            Formula::Atom(Atom::Links {
                rule: Rule::bound(r),
                side: Side::Pre,
                source: x,
                target: y,
            }),
            Formula::not(Formula::SameTag(x, y)),
        ]),
    );

    assert_eq!(
        formula.to_string(),
        "(exists ?r0 (and (model ?r0) (pre-links ?r0 ?x0 ?x1) (not (= ?x0 ?x1))))"
    );
}

#[test]
fn test_size_and_binders() {
    use crate::Interner;

    let mut interner = Interner::new();
    let r = interner.fresh_rule();
    let s = interner.fresh_rule();

    let formula = Formula::Or(vec![
        Formula::exists(r, Formula::Constant(true)),
        Formula::not(Formula::exists(s, Formula::Constant(false))),
    ]);

    assert_eq!(formula.size(), 6);
    assert_eq!(formula.binders(), [r, s]);
    assert_eq!(Rule::concrete(RuleId(3)).to_string(), "#3");
    assert_eq!(Rule::ambient().to_string(), "ambient");
}
