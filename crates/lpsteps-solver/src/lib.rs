mod error;
mod feasibility;
pub mod graphical;
pub mod plot;
mod problem;
pub mod simplex;

pub use error::ProblemError;
pub use feasibility::{CheckStatus, FeasibilityChecker, FeasibilityReport};
pub use graphical::{GraphicalSolution, Point};
pub use plot::BoundaryLine;
pub use problem::{Constraint, ConstraintOp, Objective, ObjectiveKind, Problem};
pub use simplex::{Pivot, Simplex, SimplexStatus, SimplexTrace, SolutionStep, Tableau};
