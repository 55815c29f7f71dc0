//! Command-line interface for bridgegen.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{Config, CONFIG_FILE, INIT_TEMPLATE};
use crate::diagnostics::DiagnosticReport;
use crate::generate::{Generator, Mode};
use crate::paths;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Generate a typed call bridge from annotated TypeScript declarations.
///
/// Methods, functions and arrow-function bindings marked with `@expose`
/// are collected into namespaces and turned into a backend registration
/// module, a bridge module and a type declaration module.
#[derive(Parser)]
#[command(name = "bridgegen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the backend, bridge and type files
    Generate(GenerateArgs),
    /// Fail if any generated file is missing or out of date
    Check(CheckArgs),
    /// Create a bridgegen.yaml configuration
    Init(InitArgs),
}

/// Arguments for the generate command.
#[derive(Parser)]
pub struct GenerateArgs {
    /// Source files to scan (default: discover from the configuration)
    pub files: Vec<PathBuf>,

    /// Path to configuration YAML file (default: ./bridgegen.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exit non-zero when any warning is reported
    #[arg(long)]
    pub deny_warnings: bool,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Source files to scan (default: discover from the configuration)
    pub files: Vec<PathBuf>,

    /// Path to configuration YAML file (default: ./bridgegen.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = CONFIG_FILE)]
    pub output: PathBuf,
}

/// Load the configuration and a label for reports.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, String)> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;

    let path = match explicit {
        Some(p) => paths::absolutize(&cwd, p),
        None => {
            let default = cwd.join(CONFIG_FILE);
            if !default.exists() {
                return Ok((Config::with_root(&cwd), "(defaults)".to_string()));
            }
            default
        }
    };

    let config = Config::load(&path).with_context(|| format!("failed to load {}", path.display()))?;
    Ok((config, path.display().to_string()))
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<i32> {
    run(
        "generate",
        &args.files,
        args.config.as_deref(),
        &args.format,
        Mode::Write,
        args.deny_warnings,
    )
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    run(
        "check",
        &args.files,
        args.config.as_deref(),
        &args.format,
        Mode::Check,
        false,
    )
}

fn run(
    command: &str,
    files: &[PathBuf],
    config_path: Option<&Path>,
    format: &str,
    mode: Mode,
    deny_warnings: bool,
) -> anyhow::Result<i32> {
    // Validate format
    if format != "pretty" && format != "json" {
        eprintln!("Error: invalid format {:?}, must be 'pretty' or 'json'", format);
        return Ok(EXIT_ERROR);
    }

    let (config, config_label) = match load_config(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Run 'bridgegen init' to create a configuration file");
            return Ok(EXIT_ERROR);
        }
    };

    let generator = Generator::new(config);

    // Explicit files, or everything the configuration includes
    let files = if files.is_empty() {
        generator.discover()?
    } else {
        let cwd = std::env::current_dir()?;
        files.iter().map(|f| paths::absolutize(&cwd, f)).collect()
    };

    if files.is_empty() {
        tracing::warn!("no source files to scan");
    }

    let mut diagnostics = DiagnosticReport::new();
    let summary = match generator.run(&files, mode, &mut diagnostics) {
        Ok(summary) => summary,
        Err(e) => {
            for d in &diagnostics.diagnostics {
                eprintln!("{}: {} {}", d.severity, d.location(), d.message);
            }
            eprintln!("Error: {}", e);
            if e.outputs_untouched() {
                eprintln!("No files were written");
            } else {
                eprintln!("Outputs may be partially updated; rerun after fixing the error");
            }
            return Ok(EXIT_ERROR);
        }
    };

    let passed = !diagnostics.has_errors()
        && !(deny_warnings && diagnostics.has_warnings())
        && !(mode == Mode::Check && summary.is_stale());

    match format {
        "json" => report::write_json(command, &config_label, &diagnostics, &summary, passed)?,
        _ => report::write_pretty(command, &config_label, &diagnostics, &summary, passed),
    }

    if passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, INIT_TEMPLATE) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to point at your sources and outputs", args.output.display());
    println!("  2. Annotate methods with @expose('namespaceName')");
    println!("  3. Run: bridgegen generate --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
