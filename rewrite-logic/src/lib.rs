//! `rewrite-logic` states and checks properties of graph-rewriting
//! rules.  A rule has a pregraph (the node-labeled graph before an
//! atomic edit), a postgraph (the graph after it), and an action (the
//! parent/link/unlink effects the edit performed).
//!
//! Callers build a `Predicate` tree over logical `Variable`s minted
//! by an `Interner`, then hand both to an `Evaluator`.  The evaluator
//! compiles the tree to a `Formula`, asserts it once into an
//! `Oracle`, and reports SAT/UNSAT/UNKNOWN; on SAT, it also exhibits
//! a `Witness` interpretation of the variables.
//!
//! The bundled `SatOracle` grounds formulas over a finite, closed
//! world `Universe` and decides them with CryptoMiniSat, via
//! `circuit-sat`.
mod error;
mod evaluator;
mod formula;
mod intern;
mod oracle;
mod predicate;
mod universe;

pub use circuit_sat::SolverOptions;
pub use circuit_sat::Status;
pub use error::Error;
pub use evaluator::Evaluator;
pub use formula::Atom;
pub use formula::Formula;
pub use formula::Rule;
pub use intern::Identifier;
pub use intern::Interner;
pub use intern::Label;
pub use intern::RuleBinder;
pub use intern::Variable;
pub use oracle::Oracle;
pub use oracle::SatOracle;
pub use oracle::Selector;
pub use oracle::Witness;
pub use predicate::Binding;
pub use predicate::Lens;
pub use predicate::Predicate;
pub use predicate::RuleFn;
pub use universe::Action;
pub use universe::Effect;
pub use universe::EffectKind;
pub use universe::Graph;
pub use universe::RewriteRule;
pub use universe::RuleId;
pub use universe::Side;
pub use universe::Universe;
