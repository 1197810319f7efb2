//! relguard - release build guard CLI
//!
//! Runs the package pipeline for a Python workspace and propagates each
//! tool's exit status as its own.
//!
//! ## Commands
//!
//! - `build`: resolve the version, stamp it, package, restore the declaration
//! - `format`: run the formatter
//! - `lint`: style check, then type check
//! - `test`: run the test suite ("no tests collected" passes)
//! - `clean`: delete caches and build output, restore the declaration
//! - `all`: format, lint, test, build
//! - `version`: print the version a build would embed

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relguard_ci::{CiPipeline, PipelineResult, Step, StepOutcome};
use relguard_core::ProjectConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

/// Exit status when a tool cannot be found, as shells report it.
const COMMAND_NOT_FOUND: u8 = 127;

#[derive(Parser, Debug)]
#[command(name = "relguard")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Release build guard for the neatresume package", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Workspace root (default: current directory)
    #[arg(short, long, global = true, env = "RELGUARD_WORKSPACE", default_value = ".")]
    workspace: PathBuf,

    /// Config file (default: relguard.toml in the workspace, if present)
    #[arg(short, long, global = true, env = "RELGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Version declaration path, relative to the workspace
    #[arg(long, global = true, env = "RELGUARD_DECLARATION")]
    declaration: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Resolve the version, stamp it, build wheel and sdist, restore
    Build,

    /// Run the formatter
    Format,

    /// Run the style check, then the type check
    Lint,

    /// Run the test suite
    Test,

    /// Delete caches and build output, restore the version declaration
    Clean,

    /// format -> lint -> test -> build, stopping at the first failure
    All,

    /// Print the version a build would embed, without changing anything
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    relguard_core::init_tracing(cli.json, level);

    match run(&cli).await {
        Ok(code) => ExitCode::from(exit_status(code)),
        Err(err) => {
            eprintln!("{}", error_message(&err));
            ExitCode::from(error_status(&err))
        }
    }
}

fn load_config(cli: &Cli) -> Result<ProjectConfig> {
    let mut config = ProjectConfig::load(&cli.workspace, cli.config.as_deref())
        .context("Failed to load relguard configuration")?;
    if let Some(path) = &cli.declaration {
        config.declaration.path = path.clone();
    }
    Ok(config)
}

/// Run the selected command and return the step's exit status.
async fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;
    let pipeline = CiPipeline::new(&cli.workspace, &config);

    match cli.command {
        Commands::Build => cmd_step(&pipeline, Step::Build).await,
        Commands::Format => cmd_step(&pipeline, Step::Format).await,
        Commands::Lint => cmd_step(&pipeline, Step::Lint).await,
        Commands::Test => cmd_step(&pipeline, Step::Test).await,
        Commands::All => cmd_all(&pipeline).await,
        Commands::Clean => cmd_clean(cli, &config),
        Commands::Version => cmd_version(cli, &config),
    }
}

async fn cmd_step(pipeline: &CiPipeline<'_>, step: Step) -> Result<i32> {
    let outcome = pipeline
        .run_step(step)
        .await
        .with_context(|| format!("{step} step failed to run"))?;
    print_step(&outcome);
    Ok(outcome.exit_code)
}

async fn cmd_all(pipeline: &CiPipeline<'_>) -> Result<i32> {
    let result = pipeline.run_all().await.context("Pipeline failed to run")?;
    print_pipeline(&result);
    Ok(result.exit_code)
}

fn cmd_clean(cli: &Cli, config: &ProjectConfig) -> Result<i32> {
    let declaration = config.declaration_path(&cli.workspace);
    let report = relguard_core::clean(&cli.workspace, &declaration)
        .context("Failed to clean workspace")?;
    println!("Removed {} cache/build entries", report.removed.len());
    Ok(0)
}

fn cmd_version(cli: &Cli, config: &ProjectConfig) -> Result<i32> {
    let (_, version) = relguard_ci::BuildStep::new(&cli.workspace, config).resolve()?;
    println!("{version}");
    Ok(0)
}

fn print_step(outcome: &StepOutcome) {
    let status = if outcome.success() { "✓" } else { "✗" };
    match &outcome.version {
        Some(version) => println!("{status} {} ({version})", outcome.step),
        None => println!("{status} {}", outcome.step),
    }
    for stage in &outcome.stages {
        let mark = if stage.passed() { "✓" } else { "✗" };
        let note = if stage.remapped() {
            format!(", exit code {} tolerated", stage.raw_exit_code)
        } else {
            format!(", exit code: {}", stage.exit_code)
        };
        println!("  {mark} {} ({}ms{note})", stage.stage_name, stage.duration_ms);
    }
    if outcome.interrupted {
        println!("  interrupted; version declaration restored");
    }
}

fn print_pipeline(result: &PipelineResult) {
    for outcome in &result.steps {
        print_step(outcome);
    }
    println!();
    println!(
        "Summary: {}/{} steps passed ({}ms)",
        result.passed_count(),
        result.steps.len(),
        result.duration_ms
    );
}

/// Convert a step status to a process exit status.
///
/// Statuses outside 0..=255 (a tool killed without a status) become 1.
fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

/// One-line report of a fatal error and its causes, without a backtrace.
fn error_message(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

/// Process exit status for an error that stopped the step from running.
fn error_status(err: &anyhow::Error) -> u8 {
    let not_found = err
        .downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
    if not_found {
        COMMAND_NOT_FOUND
    } else {
        1
    }
}
