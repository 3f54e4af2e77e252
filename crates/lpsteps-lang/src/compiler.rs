use std::collections::HashMap;

use lpsteps_solver::{Constraint, ConstraintOp, Objective, ObjectiveKind, Problem};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::Span;
use crate::parser::{ParseError, Parser};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Unknown variable '{name}' at position {span:?}; it is not listed in `vars`")]
    UnknownVariable { name: String, span: Span },
    #[error("Variable '{name}' is declared more than once at position {span:?}")]
    DuplicateVariable { name: String, span: Span },
}

/// Any failure turning source text into a [`Problem`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

impl LoadError {
    pub fn span(&self) -> Option<Span> {
        match self {
            LoadError::Parse(ParseError::UnexpectedToken { span, .. })
            | LoadError::Parse(ParseError::ConstantTerm(span))
            | LoadError::Compile(CompileError::UnknownVariable { span, .. })
            | LoadError::Compile(CompileError::DuplicateVariable { span, .. }) => Some(*span),
            _ => None,
        }
    }
}

/// Resolves variable names to columns and lowers a [`Model`] to a [`Problem`].
#[derive(Debug, Default)]
pub struct Compiler {
    variables: Vec<String>,
    index: HashMap<String, usize>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(mut self, model: &Model) -> Result<Problem, CompileError> {
        self.collect_variables(model)?;

        let coefficients = self.lower_expr(&model.objective.expr)?;
        let kind = match model.objective.sense {
            Sense::Max => ObjectiveKind::Max,
            Sense::Min => ObjectiveKind::Min,
        };

        let constraints = model
            .constraints
            .iter()
            .map(|decl| {
                let operator = match decl.relation {
                    Relation::Le => ConstraintOp::Le,
                    Relation::Ge => ConstraintOp::Ge,
                    Relation::Eq => ConstraintOp::Eq,
                };
                Ok(Constraint::new(self.lower_expr(&decl.expr)?, operator, decl.rhs))
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(Problem {
            variables: self.variables,
            objective: Objective { coefficients, kind },
            constraints,
        })
    }

    fn declare(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            self.index.insert(name.to_string(), self.variables.len());
            self.variables.push(name.to_string());
        }
    }

    fn collect_variables(&mut self, model: &Model) -> Result<(), CompileError> {
        if let Some(decls) = &model.vars {
            for decl in decls {
                if self.index.contains_key(&decl.name) {
                    return Err(CompileError::DuplicateVariable {
                        name: decl.name.clone(),
                        span: decl.span,
                    });
                }
                self.declare(&decl.name);
            }
            // Declared list is closed; anything else fails in lower_expr
            return Ok(());
        }

        // First appearance wins: objective, then constraints top to bottom
        let exprs = std::iter::once(&model.objective.expr)
            .chain(model.constraints.iter().map(|c| &c.expr));
        for expr in exprs {
            for term in &expr.terms {
                self.declare(&term.variable);
            }
        }
        Ok(())
    }

    fn lower_expr(&self, expr: &LinearExpr) -> Result<Vec<f64>, CompileError> {
        let mut row = vec![0.0; self.variables.len()];
        for term in &expr.terms {
            let Some(&col) = self.index.get(&term.variable) else {
                return Err(CompileError::UnknownVariable {
                    name: term.variable.clone(),
                    span: term.span,
                });
            };
            row[col] += term.coefficient;
        }
        Ok(row)
    }
}

/// Parse and compile a problem written in the text format.
pub fn parse_problem(source: &str) -> Result<Problem, LoadError> {
    let model = Parser::parse(source)?;
    Ok(Compiler::new().compile(&model)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_canonical() {
        let source = r#"
            max: 3x + 5y
            x <= 4
            2y <= 12
            3x + 2y <= 18
        "#;

        let problem = parse_problem(source).unwrap();

        assert_eq!(problem.variables, vec!["x", "y"]);
        assert_eq!(problem.objective.coefficients, vec![3.0, 5.0]);
        assert_eq!(problem.objective.kind, ObjectiveKind::Max);
        assert_eq!(problem.num_constraints(), 3);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 0.0]);
        assert_eq!(problem.constraints[1].coefficients, vec![0.0, 2.0]);
        assert_eq!(problem.constraints[2].coefficients, vec![3.0, 2.0]);
        assert_eq!(problem.constraints[2].value, 18.0);
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_first_appearance_order() {
        // y shows up before x, z only in a constraint
        let problem = parse_problem("min y + x\nz + x >= 2\n").unwrap();
        assert_eq!(problem.variables, vec!["y", "x", "z"]);
        assert_eq!(problem.objective.coefficients, vec![1.0, 1.0, 0.0]);
        assert_eq!(problem.constraints[0].coefficients, vec![0.0, 1.0, 1.0]);
        assert_eq!(problem.constraints[0].operator, ConstraintOp::Ge);
    }

    #[test]
    fn test_vars_fix_order() {
        let problem = parse_problem("vars a, b\nmax b\na + b <= 3").unwrap();
        assert_eq!(problem.variables, vec!["a", "b"]);
        assert_eq!(problem.objective.coefficients, vec![0.0, 1.0]);
    }

    #[test]
    fn test_repeated_terms_are_summed() {
        let problem = parse_problem("max x + y - 0.5x\n2x + x - y = 1").unwrap();
        assert_eq!(problem.objective.coefficients, vec![0.5, 1.0]);
        assert_eq!(problem.constraints[0].coefficients, vec![3.0, -1.0]);
        assert_eq!(problem.constraints[0].operator, ConstraintOp::Eq);
    }

    #[test]
    fn test_unknown_variable() {
        let err = parse_problem("vars x, y\nmax x + y\nx + w <= 3").unwrap_err();
        match &err {
            LoadError::Compile(CompileError::UnknownVariable { name, span }) => {
                assert_eq!(name, "w");
                assert_eq!(*span, Span::new(22, 25));
            }
            other => panic!("Expected unknown variable, got {other:?}"),
        }
        assert!(err.span().is_some());
    }

    #[test]
    fn test_duplicate_declaration() {
        let err = parse_problem("vars x, x\nmax x\nx <= 1").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Compile(CompileError::DuplicateVariable { .. })
        ));
    }

    #[test]
    fn test_parse_error_passes_through() {
        let err = parse_problem("max x\nx <=").unwrap_err();
        assert_eq!(err, LoadError::Parse(ParseError::UnexpectedEof));
        assert_eq!(err.span(), None);
    }
}
