use std::collections::HashSet;
use std::fmt;

use crate::error::ProblemError;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Variable names, in column order
    pub variables: Vec<String>,
    /// Objective function
    pub objective: Objective,
    /// Constraints, in declaration order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to maximize or minimize
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: ObjectiveKind,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    Max,
    Min,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub operator: ConstraintOp,
    /// Right-hand side value
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl ObjectiveKind {
    pub fn is_max(self) -> bool {
        self == ObjectiveKind::Max
    }
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "≤",
            ConstraintOp::Ge => "≥",
            ConstraintOp::Eq => "=",
        }
    }

    /// Whether `lhs` satisfies `lhs op rhs` within `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintOp::Le => lhs <= rhs + tolerance,
            ConstraintOp::Ge => lhs >= rhs - tolerance,
            ConstraintOp::Eq => (lhs - rhs).abs() < tolerance,
        }
    }
}

impl Constraint {
    pub fn new(coefficients: Vec<f64>, operator: ConstraintOp, value: f64) -> Self {
        Self {
            coefficients,
            operator,
            value,
        }
    }

    /// Coefficient for variable `index`, zero when the row is short.
    pub fn coefficient(&self, index: usize) -> f64 {
        self.coefficients.get(index).copied().unwrap_or(0.0)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(i, coef)| format!("{}x{}", coef, i + 1))
            .collect();
        write!(f, "{} {} {}", terms.join(" + "), self.operator.symbol(), self.value)
    }
}

impl Problem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                kind: ObjectiveKind::Max,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, kind: ObjectiveKind) {
        self.objective = Objective { coefficients, kind };
    }

    pub fn maximize(mut self, coefficients: Vec<f64>) -> Self {
        self.set_objective(coefficients, ObjectiveKind::Max);
        self
    }

    pub fn minimize(mut self, coefficients: Vec<f64>) -> Self {
        self.set_objective(coefficients, ObjectiveKind::Min);
        self
    }

    pub fn add_constraint(&mut self, coefficients: Vec<f64>, operator: ConstraintOp, value: f64) {
        self.constraints.push(Constraint::new(coefficients, operator, value));
    }

    pub fn subject_to(mut self, coefficients: Vec<f64>, operator: ConstraintOp, value: f64) -> Self {
        self.add_constraint(coefficients, operator, value);
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check the shape guarantees both solvers rely on.
    ///
    /// The solvers never call this themselves; front-ends run it before
    /// handing a problem over.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.variables.len();
        if n < 2 {
            return Err(ProblemError::TooFewVariables(n));
        }

        let mut seen = HashSet::new();
        for name in &self.variables {
            if !seen.insert(name.as_str()) {
                return Err(ProblemError::DuplicateVariable(name.clone()));
            }
        }

        if self.objective.coefficients.len() != n {
            return Err(ProblemError::ObjectiveArity {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFiniteObjective);
        }

        if self.constraints.is_empty() {
            return Err(ProblemError::NoConstraints);
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintArity {
                    constraint: i + 1,
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(ProblemError::NonFiniteCoefficient { constraint: i + 1 });
            }
            if !c.value.is_finite() {
                return Err(ProblemError::NonFiniteValue { constraint: i + 1 });
            }
        }

        Ok(())
    }
}
