//! An `Oracle` decides satisfiability of formulas: it accepts
//! assertions, answers `check` with SAT/UNSAT/UNKNOWN, and, after a
//! SAT answer, reports the interpretation it picked for each
//! variable.
//!
//! `SatOracle` grounds formulas over a finite `Universe` and hands the
//! resulting circuit to CryptoMiniSat.
mod ground;

pub use ground::SatOracle;
pub use ground::Selector;

use crate::{Error, Formula, Interner, Status, Variable};
use std::collections::BTreeMap;

pub trait Oracle {
    /// Adds `formula` to the session.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the oracle cannot give `formula` a meaning,
    /// e.g., because a rule variable escaped its quantifier.
    fn assert(&mut self, formula: &Formula, interner: &mut Interner) -> Result<(), Error>;

    /// Decides the conjunction of everything asserted so far.
    fn check(&mut self) -> Status;

    /// Returns the interpretation picked by the last `check`, if that
    /// check answered `Sat`.
    fn witness(&self, interner: &Interner) -> Option<Witness>;
}

/// The identifier each variable denotes in a satisfying
/// interpretation.  Only variables whose interpretation the formula
/// observed are bound.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Witness {
    bindings: BTreeMap<Variable, String>,
}

impl Witness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, variable: Variable, identifier: impl Into<String>) {
        self.bindings.insert(variable, identifier.into());
    }

    #[must_use]
    pub fn get(&self, variable: Variable) -> Option<&str> {
        self.bindings.get(&variable).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &str)> {
        self.bindings.iter().map(|(var, name)| (*var, name.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::iter::FromIterator<(Variable, String)> for Witness {
    fn from_iter<I: IntoIterator<Item = (Variable, String)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[test]
fn test_witness() {
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let y = interner.fresh_variable();

    let mut witness = Witness::new();
    assert!(witness.is_empty());
    witness.bind(y, "b");
    witness.bind(x, "a");

    assert_eq!(witness.get(x), Some("a"));
    assert_eq!(witness.len(), 2);
    assert_eq!(witness.iter().collect::<Vec<_>>(), [(x, "a"), (y, "b")]);
    assert_eq!(
        witness,
        vec![(x, "a".to_string()), (y, "b".to_string())]
            .into_iter()
            .collect::<Witness>()
    );
}
