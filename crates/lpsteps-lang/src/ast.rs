use crate::lexer::Span;

/// A parsed problem file, before variables are resolved
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Explicit `vars` declaration, if any
    pub vars: Option<Vec<VarDecl>>,
    pub objective: ObjectiveDecl,
    pub constraints: Vec<ConstraintDecl>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub span: Span,
    pub name: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Max,
    Min,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveDecl {
    pub span: Span,
    pub sense: Sense,
    pub expr: LinearExpr,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDecl {
    pub span: Span,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

/// Sum of `coefficient * variable` terms
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr {
    pub span: Span,
    pub terms: Vec<Term>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub span: Span,
    pub coefficient: f64,
    pub variable: String,
}
