//! Constraint boundary segments for drawing the graphical method.

use crate::graphical::{EPSILON, GraphicalSolution};
use crate::problem::Problem;

/// How far past the right-most point the boundary lines are drawn.
pub const PLOT_MARGIN: f64 = 10.0;

/// Straight segment along one constraint boundary
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLine {
    /// 1-based constraint number
    pub constraint: usize,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// One boundary segment per drawable constraint of a two-variable problem.
///
/// Segments span `x` from 0 to the largest point `x` plus [`PLOT_MARGIN`].
/// Rows with both coefficients zero have no boundary and are skipped.
pub fn boundary_lines(problem: &Problem, solution: &GraphicalSolution) -> Vec<BoundaryLine> {
    let max_x = solution
        .points
        .iter()
        .chain(solution.optimal.iter())
        .map(|p| p.x)
        .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |m| m.max(x))))
        .unwrap_or(0.0);
    let extent = max_x + PLOT_MARGIN;

    problem
        .constraints
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let (a, b) = (c.coefficient(0), c.coefficient(1));
            let (from, to) = if b.abs() > EPSILON {
                let y_at = |x: f64| (c.value - a * x) / b;
                ((0.0, y_at(0.0)), (extent, y_at(extent)))
            } else if a.abs() > EPSILON {
                let x = c.value / a;
                ((x, 0.0), (x, extent))
            } else {
                return None;
            };
            Some(BoundaryLine {
                constraint: i + 1,
                from,
                to,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphical;
    use crate::problem::ConstraintOp;

    #[test]
    fn test_lines_extend_past_points() {
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0)
            .subject_to(vec![0.0, 0.0], ConstraintOp::Le, 1.0);
        let solution = graphical::solve(&problem);
        let lines = boundary_lines(&problem, &solution);

        // Largest feasible x is 4
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], BoundaryLine { constraint: 1, from: (4.0, 0.0), to: (4.0, 14.0) });
        assert_eq!(lines[1], BoundaryLine { constraint: 2, from: (0.0, 6.0), to: (14.0, 6.0) });
        assert_eq!(lines[2], BoundaryLine { constraint: 3, from: (0.0, 9.0), to: (14.0, -12.0) });
    }

    #[test]
    fn test_no_points_uses_margin() {
        let problem = Problem::new(vec!["x".to_string(), "y".to_string()])
            .maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 5.0)
            .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 3.0);
        let solution = graphical::solve(&problem);
        assert!(solution.points.is_empty());

        let lines = boundary_lines(&problem, &solution);
        assert_eq!(lines[0].to, (PLOT_MARGIN, -5.0));
    }
}
