use crate::ast::*;
use crate::lexer::{Span, Token, TokenKind};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Constant term without a variable at position {0:?}")]
    ConstantTerm(Span),
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Comments carry no meaning and are dropped up front.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self { tokens, pos: 0 }
    }

    pub fn parse(source: &str) -> Result<Model, ParseError> {
        let tokens = crate::lexer::Lexer::tokenize(source);
        let mut parser = Parser::new(tokens);
        parser.parse_model()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn skip_newlines(&mut self) {
        while self.peek_kind() == TokenKind::Newline {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            self.advance().ok_or(ParseError::UnexpectedEof)
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    /// A statement ends at a newline, `;`, or the end of input.
    fn expect_end_of_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn parse_model(&mut self) -> Result<Model, ParseError> {
        self.skip_newlines();

        let vars = if self.peek_kind() == TokenKind::Vars {
            let decls = self.parse_vars()?;
            self.skip_newlines();
            Some(decls)
        } else {
            None
        };

        let objective = self.parse_objective()?;

        let mut constraints = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek_kind() == TokenKind::Eof {
                break;
            }
            constraints.push(self.parse_constraint()?);
        }

        Ok(Model {
            vars,
            objective,
            constraints,
        })
    }

    fn parse_vars(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        self.expect(TokenKind::Vars)?;
        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }

        let mut decls = Vec::new();
        loop {
            let token = self.expect(TokenKind::Ident)?;
            decls.push(VarDecl {
                span: token.span,
                name: token.text,
            });
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }

        self.expect_end_of_statement()?;
        Ok(decls)
    }

    fn parse_objective(&mut self) -> Result<ObjectiveDecl, ParseError> {
        let (sense, start) = match self.peek_kind() {
            TokenKind::Max => (Sense::Max, self.advance()),
            TokenKind::Min => (Sense::Min, self.advance()),
            _ => return Err(self.unexpected("max or min")),
        };
        let start = start.ok_or(ParseError::UnexpectedEof)?.span;

        if self.peek_kind() == TokenKind::Colon {
            self.advance();
        }

        let expr = self.parse_expr()?;
        self.expect_end_of_statement()?;

        Ok(ObjectiveDecl {
            span: start.merge(expr.span),
            sense,
            expr,
        })
    }

    fn parse_constraint(&mut self) -> Result<ConstraintDecl, ParseError> {
        let expr = self.parse_expr()?;

        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();

        let (rhs, rhs_span) = self.parse_signed_number()?;
        self.expect_end_of_statement()?;

        Ok(ConstraintDecl {
            span: expr.span.merge(rhs_span),
            expr,
            relation,
            rhs,
        })
    }

    fn parse_signed_number(&mut self) -> Result<(f64, Span), ParseError> {
        let mut sign = 1.0;
        let mut start = None;
        if matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let token = self.advance().ok_or(ParseError::UnexpectedEof)?;
            if token.kind == TokenKind::Minus {
                sign = -1.0;
            }
            start = Some(token.span);
        }

        let token = self.expect(TokenKind::Number)?;
        let value = parse_number(&token)?;
        let span = start.map_or(token.span, |s| s.merge(token.span));
        Ok((sign * value, span))
    }

    fn parse_expr(&mut self) -> Result<LinearExpr, ParseError> {
        let mut terms = Vec::new();

        // Leading sign is optional on the first term only
        let mut sign = 1.0;
        let mut sign_span = None;
        if matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let token = self.advance().ok_or(ParseError::UnexpectedEof)?;
            if token.kind == TokenKind::Minus {
                sign = -1.0;
            }
            sign_span = Some(token.span);
        }
        terms.push(self.parse_term(sign, sign_span)?);

        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            let token = self.advance().ok_or(ParseError::UnexpectedEof)?;
            let sign = if token.kind == TokenKind::Minus { -1.0 } else { 1.0 };
            terms.push(self.parse_term(sign, Some(token.span))?);
        }

        let span = terms
            .iter()
            .map(|t| t.span)
            .reduce(Span::merge)
            .unwrap_or(Span::new(0, 0));
        Ok(LinearExpr { span, terms })
    }

    fn parse_term(&mut self, sign: f64, sign_span: Option<Span>) -> Result<Term, ParseError> {
        let mut coefficient = 1.0;
        let mut span = sign_span;

        if self.peek_kind() == TokenKind::Number {
            let token = self.expect(TokenKind::Number)?;
            coefficient = parse_number(&token)?;
            span = Some(span.map_or(token.span, |s| s.merge(token.span)));

            if self.peek_kind() == TokenKind::Star {
                self.advance();
            } else if self.peek_kind() != TokenKind::Ident {
                return Err(ParseError::ConstantTerm(token.span));
            }
        }

        let ident = self.expect(TokenKind::Ident)?;
        let span = span.map_or(ident.span, |s| s.merge(ident.span));

        Ok(Term {
            span,
            coefficient: sign * coefficient,
            variable: ident.text,
        })
    }
}

fn parse_number(token: &Token) -> Result<f64, ParseError> {
    token
        .text
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let source = "max: 3x + 5y\nx <= 4\n2y <= 12\n3x + 2*y <= 18\n";
        let model = Parser::parse(source).unwrap();

        assert!(model.vars.is_none());
        assert_eq!(model.objective.sense, Sense::Max);
        let coefs: Vec<_> = model
            .objective
            .expr
            .terms
            .iter()
            .map(|t| (t.coefficient, t.variable.as_str()))
            .collect();
        assert_eq!(coefs, vec![(3.0, "x"), (5.0, "y")]);

        assert_eq!(model.constraints.len(), 3);
        assert_eq!(model.constraints[0].relation, Relation::Le);
        assert_eq!(model.constraints[0].rhs, 4.0);
        assert_eq!(model.constraints[2].expr.terms[1].coefficient, 2.0);
        assert_eq!(model.constraints[2].expr.terms[1].variable, "y");
    }

    #[test]
    fn test_parse_signs() {
        let source = "min -x - 2.5y\n-x + y >= -3\nx - y = 0";
        let model = Parser::parse(source).unwrap();

        assert_eq!(model.objective.sense, Sense::Min);
        assert_eq!(model.objective.expr.terms[0].coefficient, -1.0);
        assert_eq!(model.objective.expr.terms[1].coefficient, -2.5);
        assert_eq!(model.constraints[0].relation, Relation::Ge);
        assert_eq!(model.constraints[0].rhs, -3.0);
        assert_eq!(model.constraints[1].relation, Relation::Eq);
        assert_eq!(model.constraints[1].expr.terms[1].coefficient, -1.0);
    }

    #[test]
    fn test_parse_vars_and_comments() {
        let source = r#"// production plan
vars x1, x2
maximize 2x1 + x2 // profit
x1 + x2 <= 10; x1 <= 6
"#;
        let model = Parser::parse(source).unwrap();

        let vars: Vec<_> = model
            .vars
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(vars, vec!["x1", "x2"]);
        assert_eq!(model.constraints.len(), 2);
    }

    #[test]
    fn test_term_span() {
        let model = Parser::parse("max 3 * x").unwrap();
        assert_eq!(model.objective.expr.terms[0].span, Span::new(4, 9));
    }

    #[test]
    fn test_constant_term_is_error() {
        let err = Parser::parse("max x\nx + 3 <= 4").unwrap_err();
        assert!(matches!(err, ParseError::ConstantTerm(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_relation() {
        let err = Parser::parse("max x\nx + y 4").unwrap_err();
        match err {
            ParseError::UnexpectedToken { expected, .. } => assert_eq!(expected, "<=, >= or ="),
            other => panic!("Expected unexpected token, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_objective() {
        let err = Parser::parse("x + y <= 4").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert_eq!(Parser::parse("").unwrap_err(), ParseError::UnexpectedEof);
    }
}
