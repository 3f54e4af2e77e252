//! WASM bindings for lpsteps
//!
//! JavaScript-facing entry points used by the browser front-end: problem
//! parsing, editor diagnostics and highlighting, and both narrated solvers.

use wasm_bindgen::prelude::*;

use crate::compiler::parse_problem;
use crate::lexer::{Lexer, TokenKind};
use lpsteps_solver::{
    BoundaryLine, FeasibilityChecker, GraphicalSolution, Problem, SimplexTrace, graphical, plot,
    simplex::Simplex,
};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse and validate, then refuse problems without a feasible point.
fn load_feasible(source: &str) -> Result<Problem, String> {
    let problem = parse_problem(source).map_err(|e| e.to_string())?;
    problem.validate().map_err(|e| e.to_string())?;

    let report = FeasibilityChecker::new().check(&problem);
    if !report.is_feasible() {
        return Err("The problem has no feasible solution".to_string());
    }
    Ok(problem)
}

/// Parse source text and return the compiled problem as JSON
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let problem = parse_problem(source).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&problem)
}

/// Run the feasibility check and return the report
#[wasm_bindgen]
pub fn check(source: &str) -> Result<JsValue, JsValue> {
    let problem = parse_problem(source).map_err(|e| JsValue::from_str(&e.to_string()))?;
    problem
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&FeasibilityChecker::new().check(&problem))
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphicalResult {
    #[serde(flatten)]
    solution: GraphicalSolution,
    objective_value: Option<f64>,
    lines: Vec<BoundaryLine>,
}

fn graphical_result(source: &str) -> Result<GraphicalResult, String> {
    let problem = load_feasible(source)?;
    let solution = graphical::solve(&problem);
    Ok(GraphicalResult {
        objective_value: solution.optimal_value(&problem),
        lines: plot::boundary_lines(&problem, &solution),
        solution,
    })
}

fn simplex_trace(source: &str, solver: &Simplex) -> Result<SimplexTrace, String> {
    let problem = load_feasible(source)?;
    Ok(solver.solve_traced(&problem))
}

/// Solve a two-variable problem with the graphical method
#[wasm_bindgen]
pub fn solve_graphical(source: &str) -> Result<JsValue, JsValue> {
    let result = graphical_result(source).map_err(|e| JsValue::from_str(&e))?;
    to_js(&result)
}

/// Solve with the narrated simplex method and the default iteration cap
#[wasm_bindgen]
pub fn solve_simplex(source: &str) -> Result<JsValue, JsValue> {
    let trace = simplex_trace(source, &Simplex::new()).map_err(|e| JsValue::from_str(&e))?;
    to_js(&trace)
}

/// Like [`solve_simplex`], stopping after `max_iterations` pivots
#[wasm_bindgen]
pub fn solve_simplex_capped(source: &str, max_iterations: usize) -> Result<JsValue, JsValue> {
    let solver = Simplex::new().with_max_iterations(max_iterations);
    let trace = simplex_trace(source, &solver).map_err(|e| JsValue::from_str(&e))?;
    to_js(&trace)
}

/// Validate source code and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source);
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Get semantic tokens for syntax highlighting
#[wasm_bindgen]
pub fn get_semantic_tokens(source: &str) -> Result<JsValue, JsValue> {
    let tokens: Vec<SemanticToken> = Lexer::tokenize(source)
        .into_iter()
        .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Eof))
        .map(|t| SemanticToken {
            start: t.span.start,
            end: t.span.end,
            token_type: semantic_type(t.kind).to_string(),
        })
        .collect();
    to_js(&tokens)
}

fn semantic_type(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Max | TokenKind::Min | TokenKind::Vars => "keyword",
        TokenKind::Ident => "variable",
        TokenKind::Number => "number",
        TokenKind::Comment => "comment",
        TokenKind::Colon | TokenKind::Comma => "delimiter",
        TokenKind::Plus | TokenKind::Minus | TokenKind::Star => "operator",
        TokenKind::Le | TokenKind::Ge | TokenKind::Eq => "operator",
        TokenKind::Newline | TokenKind::Eof => "whitespace",
        TokenKind::Error => "error",
    }
}

#[derive(serde::Serialize)]
struct SemanticToken {
    start: usize,
    end: usize,
    token_type: String,
}

#[derive(serde::Serialize, Debug)]
struct Diagnostic {
    start: usize,
    end: usize,
    severity: String,
    message: String,
}

fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let whole = |severity: &str, message: String| Diagnostic {
        start: 0,
        end: source.len(),
        severity: severity.to_string(),
        message,
    };

    let problem = match parse_problem(source) {
        Ok(problem) => problem,
        Err(e) => {
            let diagnostic = match e.span() {
                Some(span) => Diagnostic {
                    start: span.start,
                    end: span.end,
                    severity: "error".to_string(),
                    message: e.to_string(),
                },
                None => whole("error", e.to_string()),
            };
            return vec![diagnostic];
        }
    };

    let mut diagnostics = Vec::new();
    if let Err(e) = problem.validate() {
        diagnostics.push(whole("error", e.to_string()));
    } else if problem.num_variables() != 2 {
        diagnostics.push(whole(
            "info",
            format!(
                "{} variables: only the simplex method applies",
                problem.num_variables()
            ),
        ));
    }
    diagnostics
}
