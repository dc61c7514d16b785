#![forbid(unsafe_code)]

mod config;
mod input;
mod output;

use anyhow::Context;
use clap::Parser;
use config::{FlagOverrides, Settings};
use evcent_core::{EngineConfig, PowerIteration, Termination};
use output::{CliError, OutputMode, Renderer, render_error};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "evcent: eigenvector centrality by power iteration",
    long_about = "Compute eigenvector centrality for a graph given as a square 0/1 adjacency \
                  matrix. Iterates until successive normalization values differ by at most 0.005.",
    after_help = "EXAMPLES:\n    # Print every iteration\n    evcent graph.txt\n\n    # Only the final scores, capped at 1000 iterations\n    evcent graph.txt --final-only --max-iterations 1000\n\n    # Emit machine-readable output\n    evcent graph.txt --json"
)]
struct Cli {
    /// Adjacency matrix file: one row per line, values 0 or 1 separated by spaces.
    file: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Stop after this many iterations even without convergence.
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// Emit JSON lines instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Print only the last iteration.
    #[arg(long)]
    final_only: bool,

    /// Print the parsed matrix before iterating.
    #[arg(long)]
    show_matrix: bool,

    /// TOML config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn flag_overrides(&self) -> FlagOverrides {
        FlagOverrides {
            max_iterations: self.max_iterations,
            json: self.json,
            final_only: self.final_only,
            show_matrix: self.show_matrix,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("EVCENT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "evcent=debug,evcent_core=debug,info"
        } else {
            "evcent=info,evcent_core=info,warn"
        })
    });

    let format = env::var("EVCENT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn execute(cli: &Cli, settings: &Settings) -> anyhow::Result<()> {
    let matrix = match input::load_matrix(&cli.file) {
        Ok(matrix) => matrix,
        Err(err) => {
            error!(file = %cli.file.display(), line = ?err.line(), "invalid input: {err}");
            render_error(settings.output, &CliError::from(&err))?;
            anyhow::bail!("{err}");
        }
    };
    info!(order = matrix.order(), edges = matrix.ones(), "starting power iteration");

    let stdout = io::stdout();
    let mut renderer = Renderer::new(stdout.lock(), settings.output, settings.final_only);
    if settings.show_matrix {
        renderer.matrix(&matrix)?;
    }

    let engine_config = EngineConfig {
        max_iterations: settings.max_iterations,
        cancel: None,
    };
    let mut engine = PowerIteration::new(&matrix, engine_config);
    for record in engine.by_ref() {
        renderer.iteration(&record?)?;
    }
    let outcome = engine
        .into_outcome()
        .context("power iteration ended without a result")?;

    renderer.finish(&outcome)?;
    match outcome.termination {
        Termination::Converged => info!(iterations = outcome.iterations, "converged"),
        Termination::Degenerate => {
            warn!(iterations = outcome.iterations, "normalized value reached 0");
        }
        Termination::IterationLimit => {
            warn!(iterations = outcome.iterations, "iteration limit reached before convergence");
        }
        Termination::Cancelled => warn!(iterations = outcome.iterations, "cancelled"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match config::resolve_settings(cli.config.as_deref(), &cli.flag_overrides()) {
        Ok(settings) => settings,
        Err(err) => {
            let mode = if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Human
            };
            render_error(
                mode,
                &CliError::with_details(
                    format!("{err:#}"),
                    "fix the configuration and retry",
                    "config_error",
                ),
            )?;
            return Err(err);
        }
    };

    execute(&cli, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn file_argument_is_required() {
        let result = Cli::try_parse_from(["evcent"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_file_and_flags() {
        let cli = Cli::parse_from([
            "evcent",
            "graph.txt",
            "--max-iterations",
            "50",
            "--json",
            "--final-only",
            "--show-matrix",
        ]);
        assert_eq!(cli.file, PathBuf::from("graph.txt"));
        let flags = cli.flag_overrides();
        assert_eq!(flags.max_iterations, Some(50));
        assert!(flags.json && flags.final_only && flags.show_matrix);
    }

    #[test]
    fn defaults_leave_iterations_unbounded() {
        let cli = Cli::parse_from(["evcent", "graph.txt"]);
        assert!(cli.max_iterations.is_none());
        assert!(!cli.json);
        assert!(cli.config.is_none());
    }

    #[test]
    fn rejects_non_numeric_max_iterations() {
        let result = Cli::try_parse_from(["evcent", "g.txt", "--max-iterations", "lots"]);
        assert!(result.is_err());
    }
}
