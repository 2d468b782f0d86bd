//! `circuit-sat` lets callers describe boolean formulas as a circuit
//! of AND/OR gates over their own `Proposition`s, and asks
//! CryptoMiniSat whether the asserted outputs can all hold at once.
//!
//! Gates are Tseitin-encoded: each gate gets an auxiliary variable
//! constrained to equal its function of the inputs, so the clause set
//! stays linear in the size of the circuit.  Building a gate never
//! asserts anything; only `require` (and the cardinality gadgets)
//! constrain the solution space.
mod gadgets;
mod proposition;
mod solver_state;

pub use cryptominisat::Lit;
pub use proposition::Proposition;
pub use proposition::SolverOptions;
pub use proposition::Status;

use cryptominisat::Lbool;
use solver_state::SolverState;

pub struct Circuit<P: Proposition> {
    state: SolverState<P>,
    // Lazily allocated literal pinned to true by a unit clause.
    truth: Option<Lit>,
    // Snapshot of the assignment found by the last `Sat` solve.
    model: Option<Vec<Lbool>>,
    gates: usize,
}

impl<P: Proposition> Circuit<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SolverOptions::default())
    }

    #[must_use]
    pub fn with_options(options: SolverOptions) -> Self {
        let mut state = SolverState::new();
        let solver = state.solver();

        solver.set_num_threads(options.threads.max(1));
        if let Some(limit) = options.max_time {
            solver.set_max_time(limit.as_secs_f64());
        }

        Self {
            state,
            truth: None,
            model: None,
            gates: 0,
        }
    }

    /// Returns the literal for `prop`, allocating it on first use.
    pub fn proposition(&mut self, prop: P) -> Lit {
        self.state.ensure_input(prop)
    }

    /// Returns a literal with the fixed truth value `value`.
    pub fn constant(&mut self, value: bool) -> Lit {
        let truth = match self.truth {
            Some(lit) => lit,
            None => {
                let lit = self.state.auxiliary();
                self.state.solver().add_clause(&[lit]);
                self.truth = Some(lit);
                lit
            }
        };

        if value {
            truth
        } else {
            !truth
        }
    }

    #[must_use]
    pub fn negate(lit: Lit) -> Lit {
        !lit
    }

    /// Returns a literal equivalent to the conjunction of `inputs`.
    /// The empty conjunction is `true`.
    pub fn and(&mut self, inputs: &[Lit]) -> Lit {
        match inputs {
            [] => self.constant(true),
            [single] => *single,
            _ => {
                let output = self.state.auxiliary();
                gadgets::add_tseitin_and(self.state.solver(), output, inputs);
                self.gates += 1;
                output
            }
        }
    }

    /// Returns a literal equivalent to the disjunction of `inputs`.
    /// The empty disjunction is `false`.
    pub fn or(&mut self, inputs: &[Lit]) -> Lit {
        match inputs {
            [] => self.constant(false),
            [single] => *single,
            _ => {
                let output = self.state.auxiliary();
                gadgets::add_tseitin_or(self.state.solver(), output, inputs);
                self.gates += 1;
                output
            }
        }
    }

    /// Constrains exactly one of `lits` to be true.  With no
    /// candidates, the circuit becomes unsatisfiable.
    pub fn exactly_one(&mut self, lits: &[Lit]) {
        if lits.is_empty() {
            let bottom = self.constant(false);
            self.require(bottom);
            return;
        }

        let solver = self.state.solver();
        gadgets::add_at_least_one_constraint(solver, lits);
        gadgets::add_at_most_one_constraint(solver, lits);
    }

    /// Asserts `lit`: every solution must satisfy it.
    pub fn require(&mut self, lit: Lit) {
        self.model = None;
        self.state.solver().add_clause(&[lit]);
    }

    /// Runs CryptoMiniSat on the clauses added so far.
    pub fn solve(&mut self) -> Status {
        let status = match self.state.solver().solve() {
            Lbool::True => Status::Sat,
            Lbool::False => Status::Unsat,
            Lbool::Undef => Status::Unknown,
        };

        self.model = match status {
            Status::Sat => Some(self.state.solver().get_model().to_vec()),
            _ => None,
        };

        tracing::debug!(
            vars = self.state.num_vars(),
            inputs = self.state.num_inputs(),
            gates = self.gates,
            %status,
            "solved circuit"
        );
        status
    }

    /// Returns the value of `prop` in the last satisfying assignment.
    ///
    /// Returns `None` if the last solve was not `Sat`, or if `prop`
    /// never appeared in the circuit.
    #[must_use]
    pub fn value(&self, prop: &P) -> Option<bool> {
        let model = self.model.as_ref()?;
        let lit = self.state.lookup(prop)?;

        match model.get(lit.var() as usize)? {
            Lbool::True => Some(!lit.isneg()),
            Lbool::False => Some(lit.isneg()),
            Lbool::Undef => None,
        }
    }

    /// Number of distinct propositions fed into the circuit.
    #[must_use]
    pub fn num_propositions(&self) -> usize {
        self.state.num_inputs()
    }

    #[must_use]
    pub fn num_gates(&self) -> usize {
        self.gates
    }
}

impl<P: Proposition> Default for Circuit<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_smoke() {
    // An empty circuit is trivially satisfiable.
    let mut circuit = Circuit::<String>::new();
    assert_eq!(circuit.solve(), Status::Sat);
}

#[test]
fn test_constants() {
    let mut circuit = Circuit::<String>::new();

    let top = circuit.constant(true);
    let bottom = circuit.constant(false);
    assert_eq!(Circuit::<String>::negate(top), bottom);

    circuit.require(top);
    assert_eq!(circuit.solve(), Status::Sat);

    circuit.require(bottom);
    assert_eq!(circuit.solve(), Status::Unsat);
}

#[test]
fn test_empty_gates() {
    let mut circuit = Circuit::<String>::new();

    let empty_and = circuit.and(&[]);
    let empty_or = circuit.or(&[]);
    assert_eq!(empty_and, circuit.constant(true));
    assert_eq!(empty_or, circuit.constant(false));
    assert_eq!(circuit.num_gates(), 0);
}

#[test]
fn test_contradiction() {
    // x and not x.
    let mut circuit = Circuit::<String>::new();

    let x = circuit.proposition("x".into());
    let both = circuit.and(&[x, Circuit::<String>::negate(x)]);
    circuit.require(both);
    assert_eq!(circuit.solve(), Status::Unsat);
    assert_eq!(circuit.value(&"x".to_string()), None);
}

#[test]
fn test_model_values() {
    // (x or y) and not x forces y.
    let mut circuit = Circuit::<String>::new();

    let x = circuit.proposition("x".into());
    let y = circuit.proposition("y".into());
    let either = circuit.or(&[x, y]);
    let root = circuit.and(&[either, Circuit::<String>::negate(x)]);
    circuit.require(root);

    assert_eq!(circuit.solve(), Status::Sat);
    assert_eq!(circuit.value(&"x".to_string()), Some(false));
    assert_eq!(circuit.value(&"y".to_string()), Some(true));
    assert_eq!(circuit.value(&"z".to_string()), None);
    assert_eq!(circuit.num_propositions(), 2);
    assert_eq!(circuit.num_gates(), 2);
}

#[test]
fn test_exactly_one() {
    let mut circuit = Circuit::<u32>::new();

    let options: Vec<Lit> = (0..3).map(|i| circuit.proposition(i)).collect();
    circuit.exactly_one(&options);
    // Rule out the first two choices.
    circuit.require(!options[0]);
    circuit.require(!options[1]);

    assert_eq!(circuit.solve(), Status::Sat);
    assert_eq!(circuit.value(&2), Some(true));

    circuit.require(!options[2]);
    assert_eq!(circuit.solve(), Status::Unsat);
}

#[test]
fn test_exactly_one_of_nothing() {
    let mut circuit = Circuit::<u32>::new();

    circuit.exactly_one(&[]);
    assert_eq!(circuit.solve(), Status::Unsat);
}
