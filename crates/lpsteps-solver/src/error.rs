use thiserror::Error;

/// Shape problems found by [`Problem::validate`](crate::Problem::validate).
///
/// Constraint indices are 1-based, as shown to users.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("at least two variables are required, found {0}")]
    TooFewVariables(usize),
    #[error("variable '{0}' is declared more than once")]
    DuplicateVariable(String),
    #[error("objective needs {expected} coefficients, found {found}")]
    ObjectiveArity { expected: usize, found: usize },
    #[error("at least one constraint is required")]
    NoConstraints,
    #[error("constraint {constraint} needs {expected} coefficients, found {found}")]
    ConstraintArity {
        constraint: usize,
        expected: usize,
        found: usize,
    },
    #[error("objective has a non-finite coefficient")]
    NonFiniteObjective,
    #[error("constraint {constraint} has a non-finite coefficient")]
    NonFiniteCoefficient { constraint: usize },
    #[error("constraint {constraint} has a non-finite right-hand side")]
    NonFiniteValue { constraint: usize },
}
