//! In order to represent a circuit in CryptoMiniSat, we need a
//! mapping from `Proposition` to variable id (u32).  Gate outputs and
//! the constant `true` literal are anonymous auxiliary variables.
//!
//! CryptoMiniSat needs us to explicitly register new variables, so
//! every literal we hand out goes through `new_var`.
use super::Proposition;
use cryptominisat::Lit;
use cryptominisat::Solver;
use std::collections::HashMap;

pub struct SolverState<P: Proposition> {
    to_id: HashMap<P, Lit>,
    solver: Solver,
}

/// A `SolverState` owns a CryptoMiniSat solver, and maps propositions
/// to variables, creating new variables on demand.
impl<P: Proposition> SolverState<P> {
    /// Returns a fresh `SolverState` instance.
    pub fn new() -> Self {
        Self {
            to_id: HashMap::new(),
            solver: Solver::new(),
        }
    }

    /// Returns the variable for `wanted`, creating one on first use.
    pub fn ensure_input(&mut self, wanted: P) -> Lit {
        if let Some(id) = self.to_id.get(&wanted) {
            return *id;
        }

        let var = self.new_var();
        self.to_id.insert(wanted, var);
        var
    }

    /// Always returns a fresh auxiliary variable.
    pub fn auxiliary(&mut self) -> Lit {
        self.new_var()
    }

    /// Returns the literal already assigned to `prop`, if any.
    pub fn lookup(&self, prop: &P) -> Option<Lit> {
        self.to_id.get(prop).copied()
    }

    pub fn num_inputs(&self) -> usize {
        self.to_id.len()
    }

    pub fn num_vars(&self) -> usize {
        self.solver.nvars() as usize
    }

    pub fn solver(&mut self) -> &mut Solver {
        &mut self.solver
    }

    fn new_var(&mut self) -> Lit {
        let var = self.solver.new_var();
        assert!(self.to_id.len() <= self.solver.nvars() as usize);
        var
    }
}

#[test]
fn test_ensure_input_dedups() {
    let mut state = SolverState::<String>::new();

    let x = state.ensure_input("x".into());
    let y = state.ensure_input("y".into());
    let x_again = state.ensure_input("x".into());

    assert_eq!(x, x_again);
    assert_ne!(x, y);
    assert_eq!(state.num_inputs(), 2);
    assert_eq!(state.lookup(&"y".to_string()), Some(y));
    assert_eq!(state.lookup(&"z".to_string()), None);
}

#[test]
fn test_auxiliary_is_anonymous() {
    let mut state = SolverState::<String>::new();

    let x = state.ensure_input("x".into());
    let aux = state.auxiliary();

    assert_ne!(x, aux);
    assert_eq!(state.num_vars(), 2);
    assert_eq!(state.num_inputs(), 1);
}
