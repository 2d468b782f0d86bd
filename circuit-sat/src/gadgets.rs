//! We must translate our high-level constraints (e.g., "at most one
//! of these must be true", "this literal is the conjunction of those")
//! to CNF clauses in order to use SAT.  This module handles that
//! translation.
use cryptominisat::Lit;
use cryptominisat::Solver;

/// Add a nogood for `vars`.
pub fn add_nogood(solver: &mut Solver, nogood: &[Lit]) {
    // We don't want solutions where all the literals are satisfied.
    // In other words, at least one of them must be violated, i.e.
    // at least one of their complements must be true.
    solver.add_clause(&nogood.iter().map(|x| !*x).collect::<Vec<_>>());
}

/// At least one of `vars` must be true.  The caller must handle the
/// empty case: an empty clause is trivially unsatisfiable.
pub fn add_at_least_one_constraint(solver: &mut Solver, vars: &[Lit]) {
    solver.add_clause(vars);
}

/// No two of `vars` may be true at the same time.  Pairwise encoding:
/// interpretation domains are small.
pub fn add_at_most_one_constraint(solver: &mut Solver, vars: &[Lit]) {
    for (index, x) in vars.iter().enumerate() {
        for y in &vars[index + 1..] {
            add_nogood(solver, &[*x, *y]);
        }
    }
}

/// Constrain `output` to equal the conjunction of `inputs`.
pub fn add_tseitin_and(solver: &mut Solver, output: Lit, inputs: &[Lit]) {
    // output -> input, for each input.
    for input in inputs {
        solver.add_clause(&[!output, *input]);
    }

    // all inputs -> output.
    let mut clause: Vec<Lit> = inputs.iter().map(|x| !*x).collect();
    clause.push(output);
    solver.add_clause(&clause);
}

/// Constrain `output` to equal the disjunction of `inputs`.
pub fn add_tseitin_or(solver: &mut Solver, output: Lit, inputs: &[Lit]) {
    // input -> output, for each input.
    for input in inputs {
        solver.add_clause(&[output, !*input]);
    }

    // output -> some input.
    let mut clause: Vec<Lit> = inputs.to_vec();
    clause.push(!output);
    solver.add_clause(&clause);
}

#[cfg(test)]
fn assumptions(vars: &[Lit], values: u32) -> Vec<Lit> {
    vars.iter()
        .enumerate()
        .map(|(index, var)| Lit::new(var.var(), (values & (1 << index)) == 0).expect("ok"))
        .collect()
}

#[test]
fn test_nogood() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let (x, y, z) = (solver.new_var(), solver.new_var(), solver.new_var());

    // Add a nogood for (x, y, z)
    add_nogood(&mut solver, &[x, y, z]);

    // The constraint set is feasible.
    assert_eq!(solver.solve(), Lbool::True);
    // Iterate over the truth value for all 3 variables
    for values in 0..8 {
        // Should be true if `values != 7` (if variables not all true).
        let expected = if values == 7 {
            Lbool::False
        } else {
            Lbool::True
        };

        assert_eq!(
            solver.solve_with_assumptions(&assumptions(&[x, y, z], values)),
            expected
        );
    }
}

#[test]
fn test_exactly_one() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let vars = [solver.new_var(), solver.new_var(), solver.new_var()];

    add_at_least_one_constraint(&mut solver, &vars);
    add_at_most_one_constraint(&mut solver, &vars);

    for values in 0..8u32 {
        let expected = if values.count_ones() == 1 {
            Lbool::True
        } else {
            Lbool::False
        };

        println!("values={} expected={:?}", values, expected);
        assert_eq!(
            solver.solve_with_assumptions(&assumptions(&vars, values)),
            expected
        );
    }
}

#[test]
fn test_tseitin_and_or() {
    use cryptominisat::Lbool;

    let mut solver = Solver::new();
    let (x, y) = (solver.new_var(), solver.new_var());
    let (both, either) = (solver.new_var(), solver.new_var());

    add_tseitin_and(&mut solver, both, &[x, y]);
    add_tseitin_or(&mut solver, either, &[x, y]);

    for values in 0..4u32 {
        let inputs = assumptions(&[x, y], values);
        let x_value = (values & 1) != 0;
        let y_value = (values & 2) != 0;

        let mut with_both = inputs.clone();
        with_both.push(if x_value && y_value { both } else { !both });
        assert_eq!(solver.solve_with_assumptions(&with_both), Lbool::True);

        // The gate output is forced: the other polarity is infeasible.
        let mut against_both = inputs.clone();
        against_both.push(if x_value && y_value { !both } else { both });
        assert_eq!(solver.solve_with_assumptions(&against_both), Lbool::False);

        let mut against_either = inputs;
        against_either.push(if x_value || y_value { !either } else { either });
        assert_eq!(solver.solve_with_assumptions(&against_either), Lbool::False);
    }
}
