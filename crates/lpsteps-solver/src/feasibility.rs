//! General-purpose two-phase simplex used as a feasibility guard.
//!
//! Front-ends run this before either narrated engine so that infeasible
//! problems are rejected up front. It handles `>=` and `=` rows through
//! artificial variables, which the narrated simplex does not.

use tracing::{debug, trace};

use crate::problem::{ConstraintOp, Problem};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// An optimal solution was found
    Optimal,
    /// No point satisfies all constraints
    Infeasible,
    /// Feasible, but the objective has no finite optimum
    Unbounded,
}

/// Outcome of the feasibility check
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityReport {
    pub status: CheckStatus,
    /// Optimal values for each variable (empty unless optimal)
    pub values: Vec<f64>,
    /// Optimal objective value (NaN unless optimal)
    pub objective_value: f64,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.status != CheckStatus::Infeasible
    }

    fn infeasible() -> Self {
        Self {
            status: CheckStatus::Infeasible,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }

    fn unbounded() -> Self {
        Self {
            status: CheckStatus::Unbounded,
            values: Vec::new(),
            objective_value: f64::NAN,
        }
    }
}

/// Two-phase simplex checker
#[derive(Debug, Clone)]
pub struct FeasibilityChecker {
    /// Maximum iterations per phase
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for FeasibilityChecker {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl FeasibilityChecker {
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

    /// Solve `problem` to optimality, or report why that is impossible.
    pub fn check(&self, problem: &Problem) -> FeasibilityReport {
        let mut tableau = self.build_tableau(problem);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 && !self.phase1(&mut tableau) {
            debug!(
                component = "feasibility",
                operation = "check",
                status = "infeasible",
                "Phase 1 left artificial variables in the basis"
            );
            return FeasibilityReport::infeasible();
        }

        // Phase 2: Optimize
        if !self.phase2(&mut tableau) {
            debug!(
                component = "feasibility",
                operation = "check",
                status = "unbounded",
                "Phase 2 found an unbounded direction"
            );
            return FeasibilityReport::unbounded();
        }

        let report = self.extract_solution(&tableau, problem);
        debug!(
            component = "feasibility",
            operation = "check",
            status = "optimal",
            objective = report.objective_value,
            "Problem is feasible"
        );
        report
    }

    fn build_tableau(&self, problem: &Problem) -> DenseTableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;

        for c in &problem.constraints {
            let flip = c.value < 0.0;
            match c.operator {
                ConstraintOp::Le | ConstraintOp::Ge => {
                    n_slack += 1;
                    // A surplus column (or a negated slack) cannot start basic
                    if (c.operator == ConstraintOp::Ge) != flip {
                        n_artificial += 1;
                    }
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = DenseTableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, c) in problem.constraints.iter().enumerate() {
            for j in 0..n_vars {
                tableau.data[i][j] = c.coefficient(j);
            }

            // Keep the RHS non-negative; flipping the row flips the slack sign
            let flip = c.value < 0.0;
            if flip {
                for j in 0..n_vars {
                    tableau.data[i][j] = -tableau.data[i][j];
                }
            }
            tableau.data[i][total_cols - 1] = c.value.abs();

            match c.operator {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = if flip { -1.0 } else { 1.0 };
                    if flip {
                        tableau.data[i][artificial_idx] = 1.0;
                        tableau.basic_vars[i] = artificial_idx;
                        artificial_idx += 1;
                    } else {
                        tableau.basic_vars[i] = slack_idx;
                    }
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = if flip { 1.0 } else { -1.0 };
                    if flip {
                        tableau.basic_vars[i] = slack_idx;
                    } else {
                        tableau.data[i][artificial_idx] = 1.0;
                        tableau.basic_vars[i] = artificial_idx;
                        artificial_idx += 1;
                    }
                    slack_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). The simplex maximizes, so minimization
        // coefficients are negated.
        let obj_row = n_constraints;
        let minimize = !problem.objective.kind.is_max();
        for (j, &coef) in problem.objective.coefficients.iter().enumerate().take(n_vars) {
            tableau.data[obj_row][j] = if minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut DenseTableau) -> bool {
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.n_vars + tableau.n_slack;

        let orig_obj = tableau.data[n_constraints].clone();

        // Phase 1 objective: maximize -sum(artificials)
        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Price out the basic artificials
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        // The phase 1 objective is bounded by zero, so a column without a
        // leaving row only means no further progress
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, n_cols - 1) else {
                break;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                break;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return false;
            }
        }

        self.drive_out_artificials(tableau);

        // Restore the original objective and price out the basis
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            if tableau.data[n_constraints][basic].abs() > self.tolerance {
                let ratio = tableau.data[n_constraints][basic];
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        true
    }

    /// Pivot zero-level artificials out of the basis.
    ///
    /// Any non-artificial column with a nonzero entry in the row will do,
    /// since the row's right-hand side is zero. A row with no such entry is
    /// redundant and is left in place; phase 2 can never pivot on it.
    fn drive_out_artificials(&self, tableau: &mut DenseTableau) {
        let art_start = tableau.n_vars + tableau.n_slack;
        let rhs_col = tableau.data[0].len() - 1;

        for i in 0..tableau.basic_vars.len() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            tableau.data[i][rhs_col] = 0.0;
            let col = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            match col {
                Some(col) => {
                    trace!(
                        component = "feasibility",
                        operation = "drive_out",
                        row = i as u64,
                        col = col as u64,
                        "Artificial left the basis"
                    );
                    self.pivot(tableau, i, col);
                }
                None => {
                    for j in 0..art_start {
                        tableau.data[i][j] = 0.0;
                    }
                    tableau.data[i][rhs_col] = 0.0;
                }
            }
        }
    }

    /// Returns `false` when the problem is unbounded.
    fn phase2(&self, tableau: &mut DenseTableau) -> bool {
        // Artificial columns never re-enter
        let exclude_from = tableau.n_vars + tableau.n_slack;

        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_pivot_column(tableau, exclude_from) else {
                return true;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return false;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        true // Max iterations reached, return best found
    }

    /// Most positive reduced cost among the first `n_cols` columns.
    fn find_pivot_column(&self, tableau: &DenseTableau, n_cols: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..n_cols {
            if tableau.data[obj_row][j] > max_val {
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &DenseTableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                // Round-off can leave a basic value just below zero
                let ratio = tableau.data[i][rhs_col].max(0.0) / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut DenseTableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_rows - 1 {
            if tableau.data[i][rhs_col].abs() < self.tolerance {
                tableau.data[i][rhs_col] = 0.0;
            }
        }
    }

    fn extract_solution(&self, tableau: &DenseTableau, problem: &Problem) -> FeasibilityReport {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.data[0].len() - 1;

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }

        let objective_value = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, v)| c * v)
            .sum();

        FeasibilityReport {
            status: CheckStatus::Optimal,
            values,
            objective_value,
        }
    }
}

/// Dense tableau with explicit slack, surplus and artificial columns
struct DenseTableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}
