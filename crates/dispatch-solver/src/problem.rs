use crate::expr::{LinearExpr, VarId};
use crate::solution::ConstraintViolation;

/// Represents a linear programming problem over non-negative variables
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variables, indexed by [`VarId`]
    pub variables: Vec<Variable>,
    /// Objective function
    pub objective: Objective,
    /// Constraints, indexed by [`ConstraintId`]
    pub constraints: Vec<Constraint>,
}

/// A continuous decision variable with lower bound 0
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    /// Optional finite upper bound
    pub upper: Option<f64>,
}

/// Handle to a constraint row registered on an [`LpProblem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Linear objective; its constant is added to the reported value
    pub expr: LinearExpr,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Left-hand side, without constant part
    pub expr: LinearExpr,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl Default for LpProblem {
    fn default() -> Self {
        Self::new()
    }
}

impl LpProblem {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            objective: Objective {
                expr: LinearExpr::new(),
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    /// Register a non-negative variable, optionally bounded above
    pub fn add_variable(&mut self, name: impl Into<String>, upper: Option<f64>) -> VarId {
        self.variables.push(Variable {
            name: name.into(),
            upper,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn set_objective(&mut self, expr: impl Into<LinearExpr>, minimize: bool) {
        self.objective = Objective {
            expr: expr.into(),
            minimize,
        };
    }

    /// Add `expr op rhs`; any constant inside `expr` is moved to the right-hand side
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<LinearExpr>,
        op: ConstraintOp,
        rhs: f64,
    ) -> ConstraintId {
        let mut expr = expr.into();
        let constant = expr.take_constant();
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            op,
            rhs: rhs - constant,
        });
        ConstraintId(self.constraints.len() - 1)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id.0)
    }

    /// Objective value for a full vector of variable values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.expr.evaluate(values)
    }

    /// Rows and variable bounds that `values` violates by more than `tolerance`,
    /// worst first
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &self.constraints {
            let lhs = c.expr.evaluate(values);

            let violation = match c.op {
                ConstraintOp::Le if lhs > c.rhs + tolerance => {
                    let amt = lhs - c.rhs;
                    Some((amt, format!("{} exceeds maximum of {:.4} by {:.6}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Ge if lhs < c.rhs - tolerance => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:.4} by {:.6}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if (lhs - c.rhs).abs() > tolerance => Some((
                    (lhs - c.rhs).abs(),
                    format!("{} requires exactly {:.4} but got {:.6}", c.name, c.rhs, lhs),
                )),
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        for (var, &value) in self.variables.iter().zip(values) {
            if value < -tolerance {
                violations.push(ConstraintViolation {
                    constraint: format!("{}_lb", var.name),
                    required: 0.0,
                    actual: value,
                    violation_amount: -value,
                    description: format!("{} is negative ({:.6})", var.name, value),
                });
            }
            if let Some(upper) = var.upper {
                if value > upper + tolerance {
                    violations.push(ConstraintViolation {
                        constraint: format!("{}_ub", var.name),
                        required: upper,
                        actual: value,
                        violation_amount: value - upper,
                        description: format!("{} exceeds upper bound {:.4}", var.name, upper),
                    });
                }
            }
        }

        // Sort by violation amount (worst first)
        violations.sort_by(|a, b| {
            b.violation_amount
                .partial_cmp(&a.violation_amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        violations
    }
}
