//! An `Evaluator` answers one query: is `predicate` satisfiable
//! against one oracle session, and if so, what does each variable
//! denote?
//!
//! The evaluator owns the session and the only assertion made into
//! it.  The first `check_sat` compiles the predicate, asserts the
//! resulting formula, and decides it; later calls return the cached
//! status.  A query never goes back to the unasserted state, even
//! when compilation fails: the failure is cached too.
use crate::oracle::{Oracle, SatOracle, Witness};
use crate::{Binding, Error, Formula, Interner, Predicate, SolverOptions, Status, Universe};
use tracing::debug;

enum State {
    Unasserted,
    Asserted(Status),
    Failed(Error),
}

pub struct Evaluator<O: Oracle> {
    predicate: Predicate,
    interner: Interner,
    oracle: O,
    formula: Option<Formula>,
    state: State,
}

impl<'u> Evaluator<SatOracle<'u>> {
    /// Checks `predicate` against `universe`.  `interner` must be the
    /// one that minted the predicate's variables.
    #[must_use]
    pub fn new(universe: &'u Universe, interner: Interner, predicate: Predicate) -> Self {
        Self::with_options(universe, interner, predicate, SolverOptions::default())
    }

    #[must_use]
    pub fn with_options(
        universe: &'u Universe,
        interner: Interner,
        predicate: Predicate,
        options: SolverOptions,
    ) -> Self {
        Self::with_oracle(
            SatOracle::with_options(universe, options),
            interner,
            predicate,
        )
    }
}

impl<O: Oracle> Evaluator<O> {
    #[must_use]
    pub fn with_oracle(oracle: O, interner: Interner, predicate: Predicate) -> Self {
        Self {
            predicate,
            interner,
            oracle,
            formula: None,
            state: State::Unasserted,
        }
    }

    /// Decides the query, compiling and asserting on the first call
    /// only.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the oracle rejected the compiled formula.
    /// The error is sticky: later calls return it again.
    pub fn check_sat(&mut self) -> Result<Status, Error> {
        match &self.state {
            State::Asserted(status) => return Ok(*status),
            State::Failed(error) => return Err(error.clone()),
            State::Unasserted => {}
        }

        let formula = self
            .predicate
            .compile(Binding::ambient(), &mut self.interner);
        debug!(size = formula.size(), "compiled predicate");

        if let Err(error) = self.oracle.assert(&formula, &mut self.interner) {
            debug!(%error, "oracle rejected formula");
            self.state = State::Failed(error.clone());
            return Err(error);
        }

        let status = self.oracle.check();
        debug!(%status, "checked query");

        self.formula = Some(formula);
        self.state = State::Asserted(status);
        Ok(status)
    }

    /// Returns the interpretation of a satisfiable query, deciding the
    /// query first if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::ModelUnavailable` unless the query is `Sat`,
    /// and propagates `check_sat` errors.
    pub fn model(&mut self) -> Result<Witness, Error> {
        let status = self.check_sat()?;
        if status != Status::Sat {
            return Err(Error::ModelUnavailable { status });
        }

        self.oracle
            .witness(&self.interner)
            .ok_or(Error::ModelUnavailable { status })
    }

    /// The cached status, if the query was decided.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self.state {
            State::Asserted(status) => Some(status),
            _ => None,
        }
    }

    /// The formula asserted into the oracle, once `check_sat` ran.
    #[must_use]
    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

/// A canned oracle that counts calls.
#[cfg(test)]
struct CountingOracle {
    status: Status,
    asserts: usize,
    checks: usize,
}

#[cfg(test)]
impl CountingOracle {
    fn answering(status: Status) -> Self {
        Self {
            status,
            asserts: 0,
            checks: 0,
        }
    }
}

#[cfg(test)]
impl Oracle for CountingOracle {
    fn assert(&mut self, _formula: &Formula, _interner: &mut Interner) -> Result<(), Error> {
        self.asserts += 1;
        Ok(())
    }

    fn check(&mut self) -> Status {
        self.checks += 1;
        self.status
    }

    fn witness(&self, _interner: &Interner) -> Option<Witness> {
        match self.status {
            Status::Sat => Some(Witness::new()),
            _ => None,
        }
    }
}

#[test]
fn test_check_sat_asserts_once() {
    let interner = Interner::new();
    let mut evaluator = Evaluator::with_oracle(
        CountingOracle::answering(Status::Sat),
        interner,
        Predicate::Top,
    );

    assert_eq!(evaluator.status(), None);
    assert!(evaluator.formula().is_none());
    assert_eq!(evaluator.check_sat(), Ok(Status::Sat));
    assert_eq!(evaluator.check_sat(), Ok(Status::Sat));
    assert_eq!(evaluator.status(), Some(Status::Sat));
    assert_eq!(evaluator.formula(), Some(&Formula::Constant(true)));

    // The model call reuses the cached status as well.
    assert!(evaluator.model().is_ok());
    assert_eq!(evaluator.oracle().asserts, 1);
    assert_eq!(evaluator.oracle().checks, 1);
}

#[test]
fn test_model_unavailable() {
    for status in [Status::Unsat, Status::Unknown].iter().copied() {
        let mut evaluator = Evaluator::with_oracle(
            CountingOracle::answering(status),
            Interner::new(),
            Predicate::Bottom,
        );

        assert_eq!(evaluator.model(), Err(Error::ModelUnavailable { status }));
        assert_eq!(evaluator.model(), Err(Error::ModelUnavailable { status }));
        assert_eq!(evaluator.oracle().asserts, 1);
    }
}

#[test]
fn test_failure_is_sticky() {
    use crate::Rule;

    // No rules at all: the ambient rule does not exist.
    let universe = Universe::new();
    let mut interner = Interner::new();
    let x = interner.fresh_variable();

    let mut evaluator = Evaluator::new(&universe, interner, Predicate::PreHas(x));
    assert_eq!(evaluator.check_sat(), Err(Error::NoAmbientRule));
    assert_eq!(evaluator.check_sat(), Err(Error::NoAmbientRule));
    assert_eq!(evaluator.model(), Err(Error::NoAmbientRule));
    assert_eq!(evaluator.status(), None);

    // Quantifying over an empty universe is fine, though.
    let mut interner = Interner::new();
    let x = interner.fresh_variable();
    let some_rule = Predicate::model_has_rule(move |r: Rule| {
        Predicate::pregraph_has(r, Predicate::PreHas(x))
    });
    let mut evaluator = Evaluator::new(&universe, interner, some_rule);
    assert_eq!(evaluator.check_sat(), Ok(Status::Unsat));
}
