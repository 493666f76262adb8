/// The result of solving an LP problem
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty without a solution)
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Dual value of each constraint row, as d(objective)/d(rhs)
    pub duals: Vec<f64>,
    /// Detailed analysis
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The iteration cap was hit before optimality was proven
    IterationLimit,
}

impl SolutionStatus {
    /// Numeric status code (2 optimal, 3 infeasible, 5 unbounded, 7 iteration limit)
    pub fn code(self) -> i32 {
        match self {
            SolutionStatus::Optimal => 2,
            SolutionStatus::Infeasible => 3,
            SolutionStatus::Unbounded => 5,
            SolutionStatus::IterationLimit => 7,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            2 => Some(SolutionStatus::Optimal),
            3 => Some(SolutionStatus::Infeasible),
            5 => Some(SolutionStatus::Unbounded),
            7 => Some(SolutionStatus::IterationLimit),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "OPTIMAL",
            SolutionStatus::Infeasible => "INFEASIBLE",
            SolutionStatus::Unbounded => "UNBOUNDED",
            SolutionStatus::IterationLimit => "ITERATION_LIMIT",
        }
    }
}

/// Detailed analysis of the optimal solution
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Shadow prices (dual values) for each constraint
    /// Indicates how much the objective would change per unit increase of the RHS
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    /// For non-basic variables, indicates how much cost must change to enter solution
    pub reduced_costs: Vec<ReducedCost>,

    /// Which constraints are binding (tight) at optimum
    pub binding_constraints: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Shadow price value
    pub value: f64,
    /// Interpretation
    pub interpretation: String,
}

#[derive(Debug, Clone)]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

/// Information about a violated constraint
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Solution {
    fn without_solution(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            duals: Vec::new(),
            analysis: Analysis::default(),
        }
    }

    pub fn infeasible() -> Self {
        Self::without_solution(SolutionStatus::Infeasible, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::without_solution(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn iteration_limit() -> Self {
        Self::without_solution(SolutionStatus::IterationLimit, f64::NAN)
    }

    /// Number of primal solutions available (0 or 1)
    pub fn solution_count(&self) -> usize {
        if self.status == SolutionStatus::Optimal {
            1
        } else {
            0
        }
    }

    pub fn has_solution(&self) -> bool {
        self.solution_count() > 0
    }
}
