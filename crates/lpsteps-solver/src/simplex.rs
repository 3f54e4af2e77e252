//! Step-by-step tableau simplex.
//!
//! The tableau is kept in condensed form: one column per non-basic variable,
//! one row per basic variable. A pivot exchanges the entering column variable
//! with the leaving row variable, so the matrix never grows slack columns.
//! Every pivot builds a fresh [`Tableau`]; earlier steps are never touched.
//!
//! `z0` holds the objective of the minimisation form (`-c·x` when maximizing,
//! `c·x` when minimizing). The final step converts it back for MAX problems.

use tracing::{debug, trace, warn};

use crate::graphical::fixed;
use crate::problem::{ObjectiveKind, Problem};

/// Pivot iterations allowed before the solver gives up without a verdict.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// One snapshot of the simplex tableau
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Tableau {
    /// Variable held by each row
    pub basic_vars: Vec<String>,
    /// Variable held by each column
    pub non_basic_vars: Vec<String>,
    /// Row-major `rows x columns` matrix
    pub coefficients: Vec<Vec<f64>>,
    /// Right-hand side per row
    pub rhs: Vec<f64>,
    /// Reduced-cost row, one entry per column
    pub z: Vec<f64>,
    /// Current objective value
    pub z0: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub row: usize,
    pub col: usize,
}

/// A narrated entry in the simplex history
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionStep {
    pub tableau: Tableau,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub pivot: Option<Pivot>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub entering_var: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub leaving_var: Option<String>,
    pub explanation: String,
}

/// How the pivot loop ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    /// No column can improve the objective
    Optimal,
    /// The entering column has no positive entry
    Unbounded,
    /// The iteration cap ran out first; nothing is known about optimality
    IterationLimit,
}

/// Full simplex history together with its terminal status
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexTrace {
    pub steps: Vec<SolutionStep>,
    pub status: SimplexStatus,
    /// True objective value, present only when `status` is `Optimal`
    pub objective_value: Option<f64>,
}

impl Tableau {
    /// Slack variables `s1..sn` basic, decision variables non-basic.
    pub fn initial(problem: &Problem) -> Self {
        let maximize = problem.objective.kind.is_max();
        Self {
            basic_vars: (1..=problem.num_constraints()).map(|i| format!("s{i}")).collect(),
            non_basic_vars: problem.variables.clone(),
            coefficients: problem
                .constraints
                .iter()
                .map(|c| c.coefficients.clone())
                .collect(),
            rhs: problem.constraints.iter().map(|c| c.value).collect(),
            z: problem
                .objective
                .coefficients
                .iter()
                .map(|&c| if maximize { -c } else { c })
                .collect(),
            z0: 0.0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.basic_vars.len()
    }

    pub fn num_columns(&self) -> usize {
        self.non_basic_vars.len()
    }

    /// First column, left to right, whose reduced cost improves the objective.
    pub fn entering_column(&self, tolerance: f64) -> Option<usize> {
        self.z.iter().position(|&v| v < -tolerance)
    }

    /// Minimum-ratio row for `col`; the first row wins ties.
    pub fn leaving_row(&self, col: usize, tolerance: f64) -> Option<usize> {
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, row) in self.coefficients.iter().enumerate() {
            let val = row[col];
            if val > tolerance {
                let ratio = self.rhs[i] / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    /// Exchange the basic variable of `row` with the non-basic variable of `col`.
    ///
    /// All updates read the unmodified pivot row of `self`, so the pivot row is
    /// only normalized in the returned tableau.
    pub fn pivot(&self, row: usize, col: usize) -> Tableau {
        let pivot_row = &self.coefficients[row];
        let pivot_rhs = self.rhs[row];
        let p = pivot_row[col];

        let mut coefficients: Vec<Vec<f64>> = Vec::with_capacity(self.num_rows());
        let mut rhs: Vec<f64> = Vec::with_capacity(self.num_rows());

        for (i, current) in self.coefficients.iter().enumerate() {
            if i == row {
                continue;
            }
            let factor = current[col] / p;
            let new_row: Vec<f64> = current
                .iter()
                .zip(pivot_row)
                .enumerate()
                .map(|(j, (&a, &r))| if j == col { -factor } else { a - factor * r })
                .collect();
            coefficients.push(new_row);
            rhs.push(self.rhs[i] - factor * pivot_rhs);
        }

        let z_factor = self.z[col] / p;
        let z: Vec<f64> = self
            .z
            .iter()
            .zip(pivot_row)
            .enumerate()
            .map(|(j, (&zj, &r))| if j == col { -z_factor } else { zj - z_factor * r })
            .collect();
        let z0 = self.z0 + z_factor * pivot_rhs;

        let normalized: Vec<f64> = pivot_row
            .iter()
            .enumerate()
            .map(|(j, &r)| if j == col { 1.0 / p } else { r / p })
            .collect();
        coefficients.insert(row, normalized);
        rhs.insert(row, pivot_rhs / p);

        let mut basic_vars = self.basic_vars.clone();
        let mut non_basic_vars = self.non_basic_vars.clone();
        basic_vars[row] = self.non_basic_vars[col].clone();
        non_basic_vars[col] = self.basic_vars[row].clone();

        Tableau {
            basic_vars,
            non_basic_vars,
            coefficients,
            rhs,
            z,
            z0,
        }
    }

    /// Whether no reduced cost can still improve the objective.
    pub fn is_optimal(&self, tolerance: f64) -> bool {
        self.z.iter().all(|&v| v >= -tolerance)
    }

    /// Value of each named variable: its row's RHS when basic, 0 otherwise.
    pub fn values(&self, variables: &[String]) -> Vec<f64> {
        variables
            .iter()
            .map(|name| {
                self.basic_vars
                    .iter()
                    .position(|b| b == name)
                    .map(|i| self.rhs[i])
                    .unwrap_or(0.0)
            })
            .collect()
    }
}

/// Tableau simplex with a configurable iteration cap
#[derive(Debug, Clone)]
pub struct Simplex {
    /// Maximum pivots before stopping without a verdict
    max_iterations: usize,
    /// Tolerance for reduced-cost signs and pivot elements
    tolerance: f64,
}

impl Default for Simplex {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: 1e-10,
        }
    }
}

impl Simplex {
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

    pub fn solve(&self, problem: &Problem) -> Vec<SolutionStep> {
        self.solve_traced(problem).steps
    }

    /// Run the pivot loop and record every tableau along the way.
    pub fn solve_traced(&self, problem: &Problem) -> SimplexTrace {
        let kind = problem.objective.kind;
        let initial = Tableau::initial(problem);

        debug!(
            component = "simplex",
            operation = "solve",
            status = "start",
            rows = initial.num_rows() as u64,
            columns = initial.num_columns() as u64,
            objective = ?kind,
            "Built initial tableau"
        );

        let mut steps = vec![SolutionStep {
            tableau: initial.clone(),
            pivot: None,
            entering_var: None,
            leaving_var: None,
            explanation: "Initial simplex tableau".to_string(),
        }];

        let mut current = initial;
        let mut iteration = 1;
        let mut unbounded = false;

        while iteration <= self.max_iterations {
            let Some(col) = current.entering_column(self.tolerance) else {
                break;
            };

            let Some(row) = current.leaving_row(col, self.tolerance) else {
                warn!(
                    component = "simplex",
                    operation = "ratio_test",
                    iteration = iteration as u64,
                    entering = %current.non_basic_vars[col],
                    "No positive entry in entering column; problem is unbounded"
                );
                steps.push(SolutionStep {
                    tableau: current.clone(),
                    pivot: None,
                    entering_var: None,
                    leaving_var: None,
                    explanation: "The problem is unbounded".to_string(),
                });
                unbounded = true;
                break;
            };

            let next = current.pivot(row, col);
            let entering = current.non_basic_vars[col].clone();
            let leaving = current.basic_vars[row].clone();

            trace!(
                component = "simplex",
                operation = "pivot",
                iteration = iteration as u64,
                row = row as u64,
                col = col as u64,
                entering = %entering,
                leaving = %leaving,
                "Pivoted"
            );

            steps.push(SolutionStep {
                tableau: next.clone(),
                pivot: Some(Pivot { row, col }),
                entering_var: Some(entering),
                leaving_var: Some(leaving),
                explanation: format!(
                    "Iteration {}: pivot at position ({}, {})",
                    iteration,
                    row + 1,
                    col + 1
                ),
            });

            current = next;
            iteration += 1;
        }

        if iteration > self.max_iterations {
            warn!(
                component = "simplex",
                operation = "solve",
                status = "iteration_limit",
                max_iterations = self.max_iterations as u64,
                "Iteration cap reached before a verdict"
            );
            return SimplexTrace {
                steps,
                status: SimplexStatus::IterationLimit,
                objective_value: None,
            };
        }

        let optimal = current.is_optimal(self.tolerance);
        let mut last = current;
        if kind == ObjectiveKind::Max {
            last.z0 = 0.0 - last.z0;
        }

        let status = if unbounded {
            SimplexStatus::Unbounded
        } else {
            SimplexStatus::Optimal
        };
        let objective_value = (status == SimplexStatus::Optimal).then_some(last.z0);

        let explanation = if optimal {
            format!("Optimal solution found: objective value {}", fixed(last.z0))
        } else {
            "No optimal solution was found".to_string()
        };
        steps.push(SolutionStep {
            tableau: last,
            pivot: None,
            entering_var: None,
            leaving_var: None,
            explanation,
        });

        debug!(
            component = "simplex",
            operation = "solve",
            status = ?status,
            steps = steps.len() as u64,
            "Simplex finished"
        );

        SimplexTrace {
            steps,
            status,
            objective_value,
        }
    }
}

/// Solve with the default iteration cap.
pub fn solve(problem: &Problem) -> Vec<SolutionStep> {
    Simplex::default().solve(problem)
}
