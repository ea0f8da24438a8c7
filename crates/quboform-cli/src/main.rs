use clap::{Parser, Subcommand};
use quboform_convert::{ConstraintShape, Conversion, Pipeline, classify, estimate_penalty};
use quboform_model::Problem;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quboform")]
#[command(about = "Convert constrained binary/integer problems into QUBO form", long_about = None)]
struct Cli {
    /// Log every conversion stage to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a problem in text form
    Show {
        /// The problem JSON file
        file: PathBuf,
    },
    /// Check a problem file for errors
    Check {
        /// The problem JSON file
        file: PathBuf,
    },
    /// Convert a problem into an unconstrained binary problem
    Convert {
        /// The problem JSON file
        file: PathBuf,
        /// Penalty factor (estimated from the objective when omitted)
        #[arg(short, long)]
        penalty: Option<f64>,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Save the conversion (problem and records) to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Map a solution of a converted problem back to the original variables
    Interpret {
        /// A conversion saved by `convert --output`
        file: PathBuf,
        /// Values of the converted problem's variables, in order
        #[arg(required = true)]
        values: Vec<f64>,
        /// Objective value of the converted problem
        #[arg(long, allow_hyphen_values = true)]
        objective: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Show { file } => {
            let problem = load_problem(&file);
            print!("{}", problem);
        }
        Commands::Check { file } => {
            let problem = load_problem(&file);

            let binary = problem.variables().iter().filter(|v| v.is_binary()).count();
            let integer = problem.num_variables() - binary;

            println!("✓ {} is valid", file.display());
            println!("  {} binary variables", binary);
            println!("  {} integer variables", integer);
            println!("  {} constraints", problem.num_constraints());
            for c in problem.constraints() {
                println!("    {:20} {}", c.name, shape_name(&classify(&problem, c)));
            }
            println!("  estimated penalty: {}", estimate_penalty(&problem));
            if problem.is_qubo() {
                println!("  already in QUBO form");
            }
        }
        Commands::Convert {
            file,
            penalty,
            format,
            output,
        } => {
            let problem = load_problem(&file);

            let conversion = match Pipeline::qubo(penalty).convert(&problem) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Conversion error: {}", e);
                    std::process::exit(1);
                }
            };

            if let Some(path) = output {
                let json = match serde_json::to_string_pretty(&conversion) {
                    Ok(json) => json,
                    Err(e) => {
                        eprintln!("Error serializing conversion: {}", e);
                        std::process::exit(1);
                    }
                };
                if let Err(e) = std::fs::write(&path, json) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }

            if format == "json" {
                match serde_json::to_string_pretty(&conversion.problem) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error serializing problem: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("Stages:");
                for record in &conversion.records {
                    println!(
                        "  {:30} {:4} -> {:4} variables",
                        record.stage.to_string(),
                        record.source_len,
                        record.target_len
                    );
                }
                println!();
                print!("{}", conversion.problem);
            }
        }
        Commands::Interpret {
            file,
            values,
            objective,
        } => {
            let conversion: Conversion = match read_json(&file) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            let original = match conversion.interpret(&values) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Interpretation error: {}", e);
                    std::process::exit(1);
                }
            };

            println!("Values:");
            for (i, value) in original.iter().enumerate() {
                println!("  [{}] {}", i, value);
            }
            if let Some(value) = objective {
                println!();
                println!("Objective: {}", conversion.interpret_objective(value));
            }
        }
    }
}

fn load_problem(path: &Path) -> Problem {
    match read_json::<Problem>(path) {
        Ok(p) => {
            debug!(
                problem = p.name(),
                variables = p.num_variables(),
                constraints = p.num_constraints(),
                "loaded problem"
            );
            p
        }
        Err(e) => {
            eprintln!("✗ {} has errors:", path.display());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let source = std::fs::read_to_string(path).map_err(|e| format!("Error reading file: {}", e))?;
    serde_json::from_str(&source).map_err(|e| format!("Error parsing {}: {}", path.display(), e))
}

fn shape_name(shape: &ConstraintShape) -> &'static str {
    match shape {
        ConstraintShape::ImplicationLe { .. } | ConstraintShape::ImplicationGe { .. } => "implication",
        ConstraintShape::AtMostOne { .. } => "at most one",
        ConstraintShape::AtLeastNMinusOne { .. } => "at least n - 1",
        ConstraintShape::Generic => "generic",
    }
}
