use clap::{Parser, Subcommand, ValueEnum};
use lpsteps_solver::{
    CheckStatus, FeasibilityChecker, GraphicalSolution, Problem, Simplex, SimplexTrace, Tableau,
    graphical, plot,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "lpsteps")]
#[command(about = "Step-by-step graphical and simplex solutions of linear programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log solver activity to stderr (overrides LPSTEPS_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a two-variable problem with the graphical method
    Graphical {
        /// Problem file (.json, or the text format)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
        /// Do not run the feasibility check first
        #[arg(long)]
        skip_check: bool,
    },
    /// Solve with the tableau simplex method, one table per iteration
    Simplex {
        /// Problem file (.json, or the text format)
        file: PathBuf,
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
        /// Pivot iterations before giving up
        #[arg(long, default_value_t = lpsteps_solver::simplex::DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        /// Do not run the feasibility check first
        #[arg(long)]
        skip_check: bool,
    },
    /// Validate a problem file and report whether it is feasible
    Check {
        /// Problem file (.json, or the text format)
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::default().add_directive(LevelFilter::DEBUG.into())
    } else {
        match std::env::var("LPSTEPS_LOG") {
            Ok(value) if !value.eq_ignore_ascii_case("off") => {
                EnvFilter::try_new(&value).unwrap_or_else(|err| {
                    eprintln!("Invalid LPSTEPS_LOG filter: {}", err);
                    std::process::exit(1);
                })
            }
            _ => EnvFilter::default().add_directive(LevelFilter::OFF.into()),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: &Path) -> Problem {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let problem = if is_json {
        match serde_json::from_str::<Problem>(&source) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("JSON error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match lpsteps_lang::parse_problem(&source) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = problem.validate() {
        eprintln!("Invalid problem: {}", e);
        std::process::exit(1);
    }

    debug!(
        component = "cli",
        operation = "load",
        variables = problem.num_variables() as u64,
        constraints = problem.num_constraints() as u64,
        "Loaded problem"
    );
    problem
}

fn ensure_feasible(problem: &Problem) {
    let report = FeasibilityChecker::new().check(problem);
    info!(component = "cli", operation = "check", status = ?report.status, "Feasibility check");
    if !report.is_feasible() {
        eprintln!("The problem has no feasible solution");
        std::process::exit(1);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

/// Two decimals, never "-0.00"
fn num(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

fn print_graphical(problem: &Problem, solution: &GraphicalSolution) {
    for line in &solution.steps {
        println!("{}", line);
    }

    println!();
    println!("Points:");
    for point in &solution.points {
        println!("  {}", point.label);
    }

    println!();
    match (&solution.optimal, solution.optimal_value(problem)) {
        (Some(point), Some(value)) => {
            println!("Status: OPTIMAL");
            println!(
                "  {} = {}, {} = {}",
                problem.variables[0],
                num(point.x),
                problem.variables[1],
                num(point.y)
            );
            println!("  Objective value: {}", num(value));
        }
        _ => println!("Status: NO SOLUTION"),
    }

    let lines = plot::boundary_lines(problem, solution);
    if !lines.is_empty() {
        println!();
        println!("Boundary lines:");
        for line in &lines {
            println!(
                "  constraint {}: ({}, {}) to ({}, {})",
                line.constraint,
                num(line.from.0),
                num(line.from.1),
                num(line.to.0),
                num(line.to.1)
            );
        }
    }
}

/// Print a tableau, wrapping the cell at `mark` in brackets.
fn print_tableau(tableau: &Tableau, mark: Option<(usize, usize)>) {
    const WIDTH: usize = 10;

    let mut header = format!("{:>6}", "");
    for var in &tableau.non_basic_vars {
        header.push_str(&format!("{:>WIDTH$}", var));
    }
    header.push_str(&format!("{:>WIDTH$}", "RHS"));
    println!("{}", header);

    for (i, basic) in tableau.basic_vars.iter().enumerate() {
        let mut row = format!("{:>6}", basic);
        for (j, value) in tableau.coefficients[i].iter().enumerate() {
            let cell = if mark == Some((i, j)) {
                format!("[{}]", num(*value))
            } else {
                num(*value)
            };
            row.push_str(&format!("{:>WIDTH$}", cell));
        }
        row.push_str(&format!("{:>WIDTH$}", num(tableau.rhs[i])));
        println!("{}", row);
    }

    let mut z_row = format!("{:>6}", "z");
    for value in &tableau.z {
        z_row.push_str(&format!("{:>WIDTH$}", num(*value)));
    }
    z_row.push_str(&format!("{:>WIDTH$}", num(tableau.z0)));
    println!("{}", z_row);
}

fn print_simplex(problem: &Problem, trace: &SimplexTrace) {
    for (k, step) in trace.steps.iter().enumerate() {
        println!("{}", step.explanation);
        if let (Some(entering), Some(leaving)) = (&step.entering_var, &step.leaving_var) {
            println!("  {} enters, {} leaves", entering, leaving);
        }

        // The cell chosen from this table is recorded on the following step
        let mark = trace
            .steps
            .get(k + 1)
            .and_then(|next| next.pivot)
            .map(|p| (p.row, p.col));
        print_tableau(&step.tableau, mark);
        println!();
    }

    match trace.objective_value {
        Some(value) => {
            println!("Status: OPTIMAL");
            if let Some(last) = trace.steps.last() {
                let values = last.tableau.values(&problem.variables);
                for (name, v) in problem.variables.iter().zip(&values) {
                    println!("  {} = {}", name, num(*v));
                }
            }
            println!("  Objective value: {}", num(value));
        }
        None => println!("Status: {:?}", trace.status),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Graphical {
            file,
            format,
            skip_check,
        } => {
            let problem = load(&file);
            if problem.num_variables() != 2 {
                eprintln!(
                    "The graphical method needs exactly 2 variables, found {}",
                    problem.num_variables()
                );
                std::process::exit(1);
            }
            if !skip_check {
                ensure_feasible(&problem);
            }

            let solution = graphical::solve(&problem);
            match format {
                Format::Json => print_json(&solution),
                Format::Text => print_graphical(&problem, &solution),
            }
        }
        Commands::Simplex {
            file,
            format,
            max_iterations,
            skip_check,
        } => {
            let problem = load(&file);
            if !skip_check {
                ensure_feasible(&problem);
            }

            let trace = Simplex::new()
                .with_max_iterations(max_iterations)
                .solve_traced(&problem);
            match format {
                Format::Json => print_json(&trace),
                Format::Text => print_simplex(&problem, &trace),
            }
        }
        Commands::Check { file } => {
            let problem = load(&file);
            let report = FeasibilityChecker::new().check(&problem);

            println!("✓ {} is valid", file.display());
            println!("  {} variables", problem.num_variables());
            println!("  {} constraints", problem.num_constraints());

            match report.status {
                CheckStatus::Optimal => {
                    println!("  feasible, optimum {}", num(report.objective_value))
                }
                CheckStatus::Unbounded => println!("  feasible, objective unbounded"),
                CheckStatus::Infeasible => {
                    eprintln!("✗ {} has no feasible solution", file.display());
                    std::process::exit(1);
                }
            }
        }
    }
}
