use tracing::{info, trace, warn};

use crate::backend::{LpBackend, SolverError};
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution, SolutionStatus};

/// Consecutive degenerate pivots tolerated before pricing switches to Bland's rule
const DEGENERATE_STREAK_LIMIT: usize = 50;

/// Dense two-phase simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for pivot selection and reduced costs
    tolerance: f64,
    /// Tolerance for primal feasibility checks
    feasibility_tolerance: f64,
    /// Emit per-phase progress through `tracing`
    verbose: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
            feasibility_tolerance: 1e-7,
            verbose: false,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        self.check_problem(problem)?;

        let mut tableau = self.build_tableau(problem);
        if self.verbose {
            info!(
                rows = tableau.obj_row(),
                columns = tableau.rhs_col(),
                artificials = tableau.n_artificial,
                "simplex: tableau built"
            );
        }

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::IterationLimit => return Ok(self.finish(Solution::iteration_limit(), &tableau)),
                SimplexResult::Infeasible | SimplexResult::Unbounded => {
                    return Ok(self.finish(Solution::infeasible(), &tableau));
                }
            }
        }

        // Phase 2: Optimize, never re-entering artificial columns
        let art_start = tableau.art_start();
        match self.run_simplex(&mut tableau, art_start, 2) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Ok(self.finish(Solution::unbounded(), &tableau)),
            SimplexResult::IterationLimit => return Ok(self.finish(Solution::iteration_limit(), &tableau)),
            SimplexResult::Infeasible => return Ok(self.finish(Solution::infeasible(), &tableau)),
        }

        let solution = self.extract_solution(&tableau, problem);
        self.verify(problem, &solution)?;
        Ok(self.finish(solution, &tableau))
    }

    fn finish(&self, solution: Solution, tableau: &Tableau) -> Solution {
        if self.verbose {
            info!(
                status = solution.status.label(),
                objective = solution.objective_value,
                iterations = tableau.iterations,
                "simplex: finished"
            );
        }
        solution
    }

    fn check_problem(&self, problem: &LpProblem) -> Result<(), SolverError> {
        let n_vars = problem.num_variables();
        let check_expr = |owner: &str, expr: &crate::LinearExpr| -> Result<(), SolverError> {
            for &(var, coef) in expr.terms() {
                if var.index() >= n_vars {
                    return Err(SolverError::InvalidProblem(format!(
                        "{} references unknown variable #{}",
                        owner,
                        var.index()
                    )));
                }
                if !coef.is_finite() {
                    return Err(SolverError::InvalidProblem(format!(
                        "{} has non-finite coefficient for {}",
                        owner, problem.variables[var.index()].name
                    )));
                }
            }
            Ok(())
        };

        check_expr("objective", &problem.objective.expr)?;
        for c in &problem.constraints {
            check_expr(&c.name, &c.expr)?;
            if !c.rhs.is_finite() {
                return Err(SolverError::InvalidProblem(format!("{} has non-finite rhs", c.name)));
            }
        }
        for var in &problem.variables {
            if let Some(upper) = var.upper {
                if !upper.is_finite() {
                    return Err(SolverError::InvalidProblem(format!(
                        "{} has non-finite upper bound",
                        var.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();

        // Problem rows first, then one row per finite upper bound
        let mut rows: Vec<(Vec<f64>, ConstraintOp, f64)> = problem
            .constraints
            .iter()
            .map(|c| (c.expr.dense(n_vars), c.op, c.rhs))
            .collect();
        for (j, var) in problem.variables.iter().enumerate() {
            if let Some(upper) = var.upper {
                let mut coeffs = vec![0.0; n_vars];
                coeffs[j] = 1.0;
                rows.push((coeffs, ConstraintOp::Le, upper));
            }
        }

        // RHS must be non-negative; negating a row flips its direction
        let mut row_signs = Vec::with_capacity(rows.len());
        for (coeffs, op, rhs) in &mut rows {
            if *rhs < 0.0 {
                coeffs.iter_mut().for_each(|c| *c = -*c);
                *rhs = -*rhs;
                *op = match *op {
                    ConstraintOp::Le => ConstraintOp::Ge,
                    ConstraintOp::Ge => ConstraintOp::Le,
                    ConstraintOp::Eq => ConstraintOp::Eq,
                };
                row_signs.push(-1.0);
            } else {
                row_signs.push(1.0);
            }
        }

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let n_rows = rows.len();
        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_rows + 1],
            basic_vars: vec![0; n_rows],
            unit_cols: vec![0; n_rows],
            row_signs,
            n_vars,
            n_slack,
            n_artificial,
            iterations: 0,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coeffs, op, rhs)) in rows.into_iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(&coeffs);
            tableau.data[i][total_cols - 1] = rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    tableau.unit_cols[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    tableau.unit_cols[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). The tableau maximizes, so a minimization
        // objective is stored negated.
        let obj_row = n_rows;
        let costs = problem.objective.expr.dense(n_vars);
        for (j, coef) in costs.into_iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.data[obj_row].len();
        let rhs_col = tableau.rhs_col();
        let art_start = tableau.art_start();

        // Maximize -sum(artificials)
        let orig_obj = std::mem::replace(&mut tableau.data[obj_row], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }

        // Cancel the -1 of each basic artificial
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.run_simplex(tableau, art_start, 1) {
            SimplexResult::Optimal => {}
            SimplexResult::IterationLimit => return SimplexResult::IterationLimit,
            // Phase 1 is bounded by 0, so anything else means no feasible basis
            SimplexResult::Unbounded | SimplexResult::Infeasible => return SimplexResult::Infeasible,
        }

        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col] > self.feasibility_tolerance {
                if self.verbose {
                    info!(row = i, residual = tableau.data[i][rhs_col], "simplex: phase 1 infeasible");
                }
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis. Rows with no usable
        // pivot are redundant and keep their artificial at zero.
        for i in 0..obj_row {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let entering = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.feasibility_tolerance);
            if let Some(j) = entering {
                tableau.data[i][rhs_col] = 0.0;
                self.pivot(tableau, i, j);
            }
        }

        // Restore original objective and price out the basic columns
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio != 0.0 {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    /// Pivot until no column below `column_limit` can improve the objective
    fn run_simplex(&self, tableau: &mut Tableau, column_limit: usize, phase: u8) -> SimplexResult {
        let rhs_col = tableau.rhs_col();
        let mut degenerate_streak = 0;
        let mut pivots = 0;

        loop {
            let bland = degenerate_streak >= DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, column_limit, bland) else {
                if self.verbose {
                    info!(phase, pivots, "simplex: phase converged");
                }
                return SimplexResult::Optimal;
            };
            if pivots >= self.max_iterations {
                if self.verbose {
                    warn!(phase, pivots, "simplex: iteration limit reached");
                }
                return SimplexResult::IterationLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };

            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            if self.verbose {
                trace!(phase, pivot_row, pivot_col, bland, "simplex: pivot");
            }

            self.pivot(tableau, pivot_row, pivot_col);
            pivots += 1;
            tableau.iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, column_limit: usize, bland: bool) -> Option<usize> {
        let obj = &tableau.data[tableau.obj_row()];

        if bland {
            // Lowest index with an improving reduced cost
            return (0..column_limit).find(|&j| obj[j] > self.tolerance);
        }

        // Most positive reduced cost
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &value) in obj.iter().enumerate().take(column_limit) {
            if value > max_val {
                max_val = value;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();
        let mut best: Option<(usize, f64)> = None;

        for i in 0..tableau.obj_row() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((i, ratio)),
                Some((row, min_ratio)) => {
                    let tie = (ratio - min_ratio).abs() <= self.tolerance;
                    // Ties go to the lowest basic index
                    if (!tie && ratio < min_ratio) || (tie && tableau.basic_vars[i] < tableau.basic_vars[row]) {
                        Some((i, ratio))
                    } else {
                        Some((row, min_ratio))
                    }
                }
            };
        }

        best.map(|(row, _)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for value in tableau.data[row].iter_mut() {
            *value /= pivot_val;
        }
        tableau.data[row][col] = 1.0;

        // Eliminate column in other rows
        let pivot_row = tableau.data[row].clone();
        for (i, current) in tableau.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col];
            if factor == 0.0 {
                continue;
            }
            for (value, &p) in current.iter_mut().zip(&pivot_row) {
                *value -= factor * p;
            }
            current[col] = 0.0;
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let obj_row = tableau.obj_row();
        let rhs_col = tableau.rhs_col();
        let clean = |v: f64| if v.abs() < self.tolerance { 0.0 } else { v };

        // Extract variable values
        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = clean(tableau.data[i][rhs_col]);
            }
        }

        let objective_value = problem.objective_value(&values);

        // The objective row holds -pi at each row's unit column, with pi the
        // dual of the stored (maximized, sign-normalized) row
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let duals: Vec<f64> = (0..problem.num_constraints())
            .map(|i| clean(sense * tableau.row_signs[i] * tableau.data[obj_row][tableau.unit_cols[i]]))
            .collect();

        let analysis = self.analyze(tableau, problem, &values, &duals);

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            duals,
            analysis,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64], duals: &[f64]) -> Analysis {
        let obj_row = tableau.obj_row();
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };

        let shadow_prices: Vec<ShadowPrice> = problem
            .constraints
            .iter()
            .zip(duals)
            .map(|(constraint, &value)| {
                let interpretation = if value.abs() < self.tolerance {
                    "Non-binding constraint".to_string()
                } else if value > 0.0 {
                    format!("Increasing RHS by 1 unit would increase the objective by {:.4}", value)
                } else {
                    format!("Increasing RHS by 1 unit would decrease the objective by {:.4}", -value)
                };
                ShadowPrice {
                    constraint: constraint.name.clone(),
                    value,
                    interpretation,
                }
            })
            .collect();

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, var)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let rc = if is_basic { 0.0 } else { -sense * tableau.data[obj_row][j] };
                ReducedCost {
                    variable: var.name.clone(),
                    value: values[j],
                    reduced_cost: rc,
                    is_basic,
                }
            })
            .collect();

        let binding_constraints = shadow_prices
            .iter()
            .filter(|sp| sp.value.abs() > self.tolerance)
            .map(|sp| sp.constraint.clone())
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }

    /// Re-check the primal point against the original rows
    fn verify(&self, problem: &LpProblem, solution: &Solution) -> Result<(), SolverError> {
        let finite = solution.values.iter().chain(&solution.duals).all(|v| v.is_finite())
            && solution.objective_value.is_finite();
        if !finite {
            return Err(SolverError::Numerical("non-finite value in solution".to_string()));
        }

        let scale = problem
            .constraints
            .iter()
            .map(|c| c.rhs.abs())
            .chain(problem.variables.iter().filter_map(|v| v.upper.map(f64::abs)))
            .fold(1.0, f64::max);
        let violations = problem.violations(&solution.values, self.feasibility_tolerance * 10.0 * scale);

        match violations.first() {
            None => Ok(()),
            Some(worst) => Err(SolverError::Numerical(format!(
                "solution violates {} row(s); worst: {}",
                violations.len(),
                worst.description
            ))),
        }
    }
}

impl LpBackend for Solver {
    fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        Solver::solve(self, problem)
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    /// Column holding the +1 identity entry of each row
    unit_cols: Vec<usize>,
    /// -1.0 for rows negated to make the RHS non-negative
    row_signs: Vec<f64>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    iterations: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn rhs_col(&self) -> usize {
        self.data[self.obj_row()].len() - 1
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
