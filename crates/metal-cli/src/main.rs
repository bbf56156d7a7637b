use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use metal_syntax::{render_outline, Severity};

#[derive(Parser)]
#[command(author, version, about = "Tree-sitter tooling for the Metal Shading Language")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the Metal grammar loads into a parser
    Selftest,
    /// Report syntax errors and entry point problems
    Check {
        /// Metal source files to check
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,
    },
    /// List the shader entry points of a file
    Outline {
        /// Path to the .metal file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output format
        #[arg(long, short, env = "METAL_FORMAT", default_value = "text")]
        format: Format,
    },
    /// Count the Metal address spaces, types and attributes in a file
    Usage {
        /// Path to the .metal file
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output format
        #[arg(long, short, env = "METAL_FORMAT", default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Selftest => selftest(),
        Commands::Check { files } => check_files(&files),
        Commands::Outline { file, format } => outline_file(&file, format),
        Commands::Usage { file, format } => usage_file(&file, format),
    }
}

/// Runs the smoke suite. A grammar that fails to load panics, which ends
/// the process abnormally after the parser has been released.
fn selftest() -> Result<bool> {
    let mut stdout = io::stdout().lock();
    metal_syntax::smoke::run(&mut stdout).context("Failed to write test report")?;
    Ok(true)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn check_files(files: &[PathBuf]) -> Result<bool> {
    let mut error_count = 0;

    for path in files {
        let content = read_source(path)?;
        let diagnostics = metal_syntax::check(&content)?;
        tracing::debug!(path = %path.display(), diagnostics = diagnostics.len(), "checked file");

        if diagnostics.is_empty() {
            println!("{} {}", "✓".green().bold(), path.display());
            continue;
        }

        let filename = path.display().to_string();
        for diag in &diagnostics {
            let severity = match diag.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };

            eprintln!(
                "{}:{}:{}: {}: {}",
                filename,
                diag.span.start_line + 1,
                diag.span.start_col + 1,
                severity,
                diag.message
            );
        }

        error_count += diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
    }

    if error_count > 0 {
        eprintln!("\n{}: {} error(s) found", "error".red().bold(), error_count);
        return Ok(false);
    }
    Ok(true)
}

fn outline_file(path: &Path, format: Format) -> Result<bool> {
    let content = read_source(path)?;
    let parsed = metal_syntax::Parser::parse(&content)?;
    let entries = parsed.outline();
    tracing::debug!(path = %path.display(), entries = entries.len(), "outlined file");

    match format {
        Format::Text if entries.is_empty() => {
            println!("{} no entry points in {}", "note".blue().bold(), path.display());
        }
        Format::Text => print!("{}", render_outline(&entries)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(true)
}

fn usage_file(path: &Path, format: Format) -> Result<bool> {
    let content = read_source(path)?;
    let parsed = metal_syntax::Parser::parse(&content)?;
    let usage = parsed.usage();

    match format {
        Format::Text => {
            println!("{}", "Metal usage".bold().underline());
            println!();

            if usage.is_empty() {
                println!("  (none)");
                return Ok(true);
            }

            if !usage.address_spaces.is_empty() {
                println!("{}", "Address spaces:".bold());
                for (space, count) in &usage.address_spaces {
                    println!("  {} {}", space.to_string().cyan(), count);
                }
            }
            if !usage.types.is_empty() {
                println!("{}", "Types:".bold());
                for (name, count) in &usage.types {
                    println!("  {} {}", name.green(), count);
                }
            }
            if !usage.attributes.is_empty() {
                println!("{}", "Attributes:".bold());
                for (name, count) in &usage.attributes {
                    println!("  {} {}", name.yellow(), count);
                }
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&usage)?),
    }
    Ok(true)
}
