//! Graphical method for two-variable problems.
//!
//! Candidate vertices are enumerated in a fixed order (pairwise intersections,
//! then axis intercepts per constraint, then the origin). The order decides
//! which point wins an objective tie, so it is part of the observable output.

use tracing::{debug, trace};

use crate::problem::{Constraint, Problem};

/// Tolerance for determinants, feasibility and the non-negativity clamp.
pub const EPSILON: f64 = 1e-10;

/// A vertex candidate in the (x1, x2) plane
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Display label, e.g. `(2.00, 6.00)`
    pub label: String,
}

/// Narrated result of the graphical method
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicalSolution {
    /// One line of narration per entry
    pub steps: Vec<String>,
    /// Accepted feasible points, in enumeration order
    pub points: Vec<Point>,
    /// Best point, absent when no feasible point was found
    pub optimal: Option<Point>,
}

impl Point {
    fn new(x: f64, y: f64, label: String) -> Self {
        Self { x, y, label }
    }
}

impl GraphicalSolution {
    /// Objective value at the optimal point, if any.
    pub fn optimal_value(&self, problem: &Problem) -> Option<f64> {
        self.optimal.as_ref().map(|p| objective_at(problem, p.x, p.y))
    }
}

/// Solve a two-variable problem by vertex enumeration.
///
/// Problems with any other number of variables get a single explanatory
/// step and empty results.
pub fn solve(problem: &Problem) -> GraphicalSolution {
    if problem.num_variables() != 2 {
        debug!(
            component = "graphical",
            operation = "solve",
            status = "skipped",
            variables = problem.num_variables() as u64,
            "Graphical method needs exactly two variables"
        );
        return GraphicalSolution {
            steps: vec![
                "The graphical method is only available for problems with 2 variables.".to_string(),
            ],
            points: Vec::new(),
            optimal: None,
        };
    }

    let constraints = &problem.constraints;
    let mut steps = Vec::new();
    let mut points = Vec::new();

    steps.push("1. Plot the constraints:".to_string());
    for (i, c) in constraints.iter().enumerate() {
        steps.push(format!("   {}. {}", i + 1, c));
    }

    steps.push("2. Find the intersection points:".to_string());

    for i in 0..constraints.len() {
        for j in (i + 1)..constraints.len() {
            let Some((x, y)) = intersect(&constraints[i], &constraints[j]) else {
                trace!(component = "graphical", first = i, second = j, "Parallel constraints skipped");
                continue;
            };
            let accepted = is_feasible(x, y, constraints) && x >= -EPSILON && y >= -EPSILON;
            trace!(component = "graphical", first = i, second = j, x, y, accepted, "Intersection candidate");
            if accepted {
                // Stored clamped; the label keeps the computed coordinates
                let point = Point::new(x.max(0.0), y.max(0.0), format!("({}, {})", fixed(x), fixed(y)));
                steps.push(format!("   Intersection point: {}", point.label));
                points.push(point);
            }
        }
    }

    for c in constraints {
        let (a, b) = (c.coefficient(0), c.coefficient(1));

        if a.abs() > EPSILON {
            let x = c.value / a;
            let accepted = x >= 0.0 && is_feasible(x, 0.0, constraints);
            trace!(component = "graphical", x, y = 0.0, accepted, "Axis intercept candidate");
            if accepted {
                let point = Point::new(x, 0.0, format!("({}, 0)", fixed(x)));
                steps.push(format!("   Intersection with the x-axis: {}", point.label));
                points.push(point);
            }
        }

        if b.abs() > EPSILON {
            let y = c.value / b;
            let accepted = y >= 0.0 && is_feasible(0.0, y, constraints);
            trace!(component = "graphical", x = 0.0, y, accepted, "Axis intercept candidate");
            if accepted {
                let point = Point::new(0.0, y, format!("(0, {})", fixed(y)));
                steps.push(format!("   Intersection with the y-axis: {}", point.label));
                points.push(point);
            }
        }
    }

    if is_feasible(0.0, 0.0, constraints) {
        let origin = Point::new(0.0, 0.0, "(0, 0)".to_string());
        steps.push(format!("   Origin: {}", origin.label));
        points.push(origin);
    }

    steps.push("3. Evaluate the objective function at each feasible point:".to_string());

    let maximize = problem.objective.kind.is_max();
    let mut best_value = if maximize { f64::NEG_INFINITY } else { f64::INFINITY };
    let mut optimal: Option<Point> = None;

    for point in &points {
        let value = objective_at(problem, point.x, point.y);
        steps.push(format!("   At {}: {}", point.label, fixed(value)));

        // Strict comparison keeps the first point on ties.
        let better = if maximize { value > best_value } else { value < best_value };
        if better {
            best_value = value;
            optimal = Some(point.clone());
        }
    }

    match &optimal {
        Some(point) => {
            steps.push(format!("4. Optimal solution: {}", point.label));
            steps.push(format!("   Objective value: {}", fixed(best_value)));
        }
        None => steps.push("4. No optimal solution was found".to_string()),
    }

    debug!(
        component = "graphical",
        operation = "solve",
        status = "success",
        points = points.len() as u64,
        optimal = optimal.is_some(),
        "Enumerated feasible vertices"
    );

    GraphicalSolution {
        steps,
        points,
        optimal,
    }
}

/// Intersection of two constraint boundary lines by Cramer's rule.
///
/// Returns `None` when the determinant is within [`EPSILON`] of zero.
pub fn intersect(c1: &Constraint, c2: &Constraint) -> Option<(f64, f64)> {
    let (a1, b1) = (c1.coefficient(0), c1.coefficient(1));
    let (a2, b2) = (c2.coefficient(0), c2.coefficient(1));

    let det = a1 * b2 - b1 * a2;
    if det.abs() <= EPSILON {
        return None;
    }

    let x = (c1.value * b2 - c2.value * b1) / det;
    let y = (a1 * c2.value - a2 * c1.value) / det;
    Some((x, y))
}

/// Whether `(x, y)` satisfies every constraint within [`EPSILON`].
pub fn is_feasible(x: f64, y: f64, constraints: &[Constraint]) -> bool {
    constraints.iter().all(|c| {
        let lhs = c.coefficient(0) * x + c.coefficient(1) * y;
        c.operator.holds(lhs, c.value, EPSILON)
    })
}

/// Two-decimal rendering that never prints `-0.00` for an exact zero.
pub(crate) fn fixed(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

fn objective_at(problem: &Problem, x: f64, y: f64) -> f64 {
    let coefficients = &problem.objective.coefficients;
    let c0 = coefficients.first().copied().unwrap_or(0.0);
    let c1 = coefficients.get(1).copied().unwrap_or(0.0);
    c0 * x + c1 * y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    fn canonical() -> Problem {
        // Maximize: 3x + 5y
        // Subject to:
        //   x <= 4
        //   2y <= 12
        //   3x + 2y <= 18
        // Optimal: x=2, y=6, obj=36
        Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0)
    }

    #[test]
    fn test_canonical_maximization() {
        let problem = canonical();
        let solution = solve(&problem);

        let optimal = solution.optimal.clone().expect("expected an optimal point");
        assert!((optimal.x - 2.0).abs() < 1e-9, "x = {} (expected 2)", optimal.x);
        assert!((optimal.y - 6.0).abs() < 1e-9, "y = {} (expected 6)", optimal.y);
        assert_eq!(optimal.label, "(2.00, 6.00)");

        let value = solution.optimal_value(&problem).unwrap();
        assert!((value - 36.0).abs() < 1e-9, "obj = {} (expected 36)", value);

        assert_eq!(solution.steps[0], "1. Plot the constraints:");
        assert_eq!(solution.steps[1], "   1. 1x1 + 0x2 ≤ 4");
        assert!(solution.steps.contains(&"4. Optimal solution: (2.00, 6.00)".to_string()));
        assert!(solution.steps.contains(&"   Objective value: 36.00".to_string()));
    }

    #[test]
    fn test_enumeration_order() {
        let solution = solve(&canonical());
        let labels: Vec<&str> = solution.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                // pairs (1,2), (1,3), (2,3); (1,2) gives (4, 6) which violates 3x+2y<=18
                "(4.00, 3.00)",
                "(2.00, 6.00)",
                // axis intercepts per constraint
                "(4.00, 0)",
                "(0, 6.00)",
                "(0, 0)",
            ]
        );
    }

    #[test]
    fn test_points_are_feasible() {
        let problem = canonical()
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 1.0)
            .subject_to(vec![-1.0, 1.0], ConstraintOp::Le, 5.0);
        let solution = solve(&problem);

        assert!(!solution.points.is_empty());
        for p in &solution.points {
            for c in &problem.constraints {
                let lhs = c.coefficients[0] * p.x + c.coefficients[1] * p.y;
                assert!(
                    c.operator.holds(lhs, c.value, EPSILON),
                    "{} violates {}",
                    p.label,
                    c
                );
            }
        }
        // x + y >= 1 cuts the origin off
        assert!(solution.points.iter().all(|p| p.label != "(0, 0)"));
    }

    #[test]
    fn test_three_variables_degrade() {
        let problem = Problem::new(vec!["x".to_string(), "y".to_string(), "z".to_string()])
            .maximize(vec![1.0, 1.0, 1.0])
            .subject_to(vec![1.0, 1.0, 1.0], ConstraintOp::Le, 10.0);
        let solution = solve(&problem);

        assert_eq!(solution.steps.len(), 1);
        assert!(solution.points.is_empty());
        assert!(solution.optimal.is_none());
    }

    #[test]
    fn test_tie_keeps_first_point() {
        // x + y is 4 at both (4, 0) and (0, 4); the pairwise intersection
        // (4, 0) is enumerated before the y-axis intercept (0, 4).
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 1.0], ConstraintOp::Le, 4.0);
        let solution = solve(&problem);

        let optimal = solution.optimal.unwrap();
        assert_eq!((optimal.x, optimal.y), (4.0, 0.0));
        assert_eq!(optimal.label, "(4.00, 0.00)");
    }

    #[test]
    fn test_minimization() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        // Optimal: x=3, y=1, obj=9
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .minimize(vec![2.0, 3.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        let solution = solve(&problem);

        let optimal = solution.optimal.clone().unwrap();
        assert!((optimal.x - 3.0).abs() < 1e-9);
        assert!((optimal.y - 1.0).abs() < 1e-9);
        assert!((solution.optimal_value(&problem).unwrap() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_zero_intersection_is_clamped() {
        // Both lines pass through (0, 3); Cramer's rule lands a hair left of the axis
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 1.0])
            .subject_to(vec![0.1, 0.1], ConstraintOp::Le, 0.3)
            .subject_to(vec![0.1, 0.3], ConstraintOp::Le, 0.9);

        let (x, _) = intersect(&problem.constraints[0], &problem.constraints[1]).unwrap();
        assert!(x < 0.0 && x >= -EPSILON, "x = {} (expected tiny negative)", x);

        let solution = solve(&problem);
        let first = &solution.points[0];
        assert_eq!(first.x, 0.0);
        assert!(first.x.is_sign_positive());
        assert!((first.y - 3.0).abs() < 1e-9, "y = {} (expected 3)", first.y);
        assert_eq!(first.label, "(-0.00, 3.00)");
        assert!(solution.steps.contains(&"   Intersection point: (-0.00, 3.00)".to_string()));
    }

    #[test]
    fn test_parallel_constraints_skipped() {
        assert_eq!(
            intersect(
                &Constraint::new(vec![1.0, 0.0], ConstraintOp::Le, 4.0),
                &Constraint::new(vec![2.0, 0.0], ConstraintOp::Le, 10.0),
            ),
            None
        );

        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![2.0, 0.0], ConstraintOp::Le, 10.0);
        let solution = solve(&problem);
        assert!(!solution.steps.iter().any(|s| s.contains("Intersection point")));
    }

    #[test]
    fn test_equality_constraint() {
        // x + y = 5 with x <= 3: feasible segment from (3, 2) to (0, 5)
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 0.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Eq, 5.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        let solution = solve(&problem);

        let labels: Vec<&str> = solution.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["(3.00, 2.00)", "(0, 5.00)"]);
        assert_eq!(solution.optimal.unwrap().label, "(3.00, 2.00)");
    }

    #[test]
    fn test_infeasible_has_no_optimum() {
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Ge, 5.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        let solution = solve(&problem);

        assert!(solution.points.is_empty());
        assert!(solution.optimal.is_none());
        assert_eq!(solution.steps.last().unwrap(), "4. No optimal solution was found");
    }

    #[test]
    fn test_idempotent() {
        let problem = canonical();
        assert_eq!(solve(&problem), solve(&problem));
    }
}
