//! Circuitry CLI - ERC checks and edit-script replay from the command line.

use anyhow::Context;
use circuitry::{
    CheckOptions, CircuitryCore, EditScript, ErcCategory, ErcFinding, ErcReport, ReplaySummary,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "circuitry")]
#[command(about = "Netlist consistency checker and edit-script runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the electrical rule check on a project file
    Check {
        /// Path to the project file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the component library (JSON)
        #[arg(short, long, value_name = "LIB")]
        library: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if messages of this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Also report ignored messages
        #[arg(long)]
        include_ignored: bool,

        /// Only report these categories (repeatable)
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<ErcCategory>,
    },

    /// Replay an edit script on a project and report the resulting ERC
    Replay {
        /// Path to the project file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path to the component library (JSON)
        #[arg(short, long, value_name = "LIB")]
        library: PathBuf,

        /// Edit script (JSON)
        #[arg(short, long, value_name = "SCRIPT")]
        script: PathBuf,

        /// Write the edited project to this file
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List ERC message categories
    Categories {
        /// Show category descriptions
        #[arg(short = 'd', long)]
        describe: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "circuitry=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match cli.command {
        Commands::Check {
            file,
            library,
            format,
            fail_on,
            strict,
            include_ignored,
            categories,
        } => {
            let options = CheckOptions {
                include_ignored,
                strict_mode: strict,
                categories,
            };
            handle_check(&file, &library, format, fail_on, &options)
        }
        Commands::Replay {
            file,
            library,
            script,
            output,
            format,
        } => handle_replay(&file, &library, &script, output.as_deref(), format),
        Commands::Categories { describe } => {
            handle_categories(describe);
            0
        }
    };

    process::exit(exit_code);
}

fn handle_check(
    file: &Path,
    library: &Path,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    options: &CheckOptions,
) -> i32 {
    tracing::debug!(file = %file.display(), library = %library.display(), "Checking project");
    match CircuitryCore::check_files(file, library, options) {
        Ok(report) => {
            output_report(&report, None, &format);
            match fail_on {
                Some(severity) if should_fail(&report, &severity) => 1,
                _ => 0,
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn replay(
    file: &Path,
    library: &Path,
    script: &Path,
    output: Option<&Path>,
) -> anyhow::Result<(ErcReport, ReplaySummary)> {
    tracing::debug!(file = %file.display(), script = %script.display(), "Replaying script");
    let mut project = CircuitryCore::load_project(file, library)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let script = EditScript::load(script)
        .with_context(|| format!("Failed to load script {}", script.display()))?;
    let summary = CircuitryCore::replay(&mut project, &script)?;
    if let Some(output) = output {
        std::fs::write(output, project.to_text())
            .with_context(|| format!("Failed to write {}", output.display()))?;
    }
    let report = CircuitryCore::check_project(&project, file, &CheckOptions::default());
    Ok((report, summary))
}

fn handle_replay(
    file: &Path,
    library: &Path,
    script: &Path,
    output: Option<&Path>,
    format: OutputFormat,
) -> i32 {
    match replay(file, library, script, output) {
        Ok((report, summary)) => {
            output_report(&report, Some(&summary), &format);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn should_fail(report: &ErcReport, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => report.has_errors(),
        FailOnSeverity::Warning => report.has_warnings_or_errors(),
    }
}

fn output_report(report: &ErcReport, summary: Option<&ReplaySummary>, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(report, summary),
        OutputFormat::Json => output_json(report, summary),
        OutputFormat::Github => output_github(report),
    }
}

fn print_finding(finding: &ErcFinding) {
    let ignored = if finding.ignored { " (ignored)" } else { "" };
    println!("    - [{}] {}{}", finding.category, finding.message, ignored);
}

fn output_human(report: &ErcReport, summary: Option<&ReplaySummary>) {
    println!("\nProject: {} ({})", report.project, report.file.display());
    println!("{}", "─".repeat(60));

    if let Some(summary) = summary {
        println!("  Replayed {} steps ({} modified)", summary.steps, summary.modified);
        println!(
            "  Undo depth: {}, redo depth: {}",
            summary.undo_depth, summary.redo_depth
        );
        println!();
    }

    if report.findings.is_empty() {
        println!("  No ERC messages");
        return;
    }

    let errors: Vec<_> = report.findings.iter().filter(|f| f.is_error()).collect();
    let warnings: Vec<_> = report.findings.iter().filter(|f| !f.is_error()).collect();

    if !errors.is_empty() {
        println!("\n  ERRORS:");
        for finding in errors {
            print_finding(finding);
        }
    }
    if !warnings.is_empty() {
        println!("\n  WARNINGS:");
        for finding in warnings {
            print_finding(finding);
        }
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", report.stats.errors);
    println!("    Warnings: {}", report.stats.warnings);
    println!("    Ignored:  {}", report.stats.ignored);
}

fn output_json(report: &ErcReport, summary: Option<&ReplaySummary>) {
    let output = serde_json::json!({
        "file": report.file.display().to_string(),
        "project": report.project,
        "findings": report.findings,
        "stats": report.stats,
        "replay": summary,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn output_github(report: &ErcReport) {
    for finding in &report.findings {
        let level = if finding.is_error() { "error" } else { "warning" };
        println!(
            "::{} file={},title={}::{}",
            level,
            report.file.display(),
            finding.category,
            finding.message.replace('\n', " ")
        );
    }
}

fn handle_categories(describe: bool) {
    println!("ERC message categories:\n");
    for category in ErcCategory::ALL {
        println!("  {} ({})", category, category.msg_type());
        if describe {
            println!("    {}", category.description());
        }
        println!();
    }
}
