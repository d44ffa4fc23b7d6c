use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use stalewatch_catalog::{BigQueryAdapter, UsageAdapter};
use stalewatch_core::{Config, OrphanReport, Severity};
use stalewatch_dbt::{IdentifierParser, LocalStore};
use stalewatch_engine::OrphanScan;

/// Stalewatch - orphaned warehouse table detection for dbt pipelines
#[derive(Parser)]
#[command(name = "stalewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: stalewatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full scan: stitch graphs, check usage, report orphans
    Scan {
        /// Output file for report.json
        #[arg(short, long, default_value = "orphan-report.json")]
        output: PathBuf,
    },

    /// Stitch graphs and list leaf model candidates without touching the
    /// warehouse
    Candidates,

    /// Decode a node identifier and show its join key
    Parse {
        /// Node id, e.g. "source.alpha.beta.customers"
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("stalewatch.toml").exists() {
        Config::from_file(Path::new("stalewatch.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Scan { output } => scan_command(&config, &output, cli.verbose).await,
        Commands::Candidates => candidates_command(&config, cli.verbose).await,
        Commands::Parse { id } => parse_command(&config, &id),
    }
}

fn artifact_store(config: &Config) -> Result<LocalStore> {
    let root = config
        .artifact_root
        .as_ref()
        .context("artifact_root is not configured; set it in stalewatch.toml")?;
    Ok(LocalStore::new(root))
}

async fn warehouse_adapter(config: &Config) -> Result<BigQueryAdapter> {
    let Some(warehouse) = &config.warehouse else {
        bail!("no [warehouse] section in config; required for usage queries");
    };
    if warehouse.warehouse_type != "bigquery" {
        bail!("unsupported warehouse type '{}'", warehouse.warehouse_type);
    }

    let project = warehouse
        .settings
        .get("project")
        .context("warehouse config is missing 'project'")?;

    let adapter = BigQueryAdapter::with_adc(project, &warehouse.query_log_table)
        .await
        .context("failed to connect to BigQuery")?;
    Ok(adapter)
}

/// Full scan: every repository's graph + manifest, usage check, report
async fn scan_command(config: &Config, output: &Path, verbose: bool) -> Result<()> {
    if config.repositories.is_empty() {
        bail!("no repositories configured; nothing to scan");
    }

    let store = artifact_store(config)?;
    let adapter = warehouse_adapter(config).await?;

    if verbose {
        eprintln!(
            "{} {} repositories, {}-day window, {} warehouse",
            "Scanning".cyan(),
            config.repositories.len(),
            config.window_days,
            adapter.name()
        );
    }

    let report = OrphanScan::new(config, &store).run(&adapter).await;

    std::fs::write(output, report.to_json()?)
        .with_context(|| format!("failed to write {}", output.display()))?;

    print_report(&report, verbose);
    eprintln!("{} {}", "Report written to".green(), output.display());

    Ok(())
}

/// Candidate listing without warehouse access
async fn candidates_command(config: &Config, verbose: bool) -> Result<()> {
    if config.repositories.is_empty() {
        bail!("no repositories configured; nothing to scan");
    }

    let store = artifact_store(config)?;

    if verbose {
        eprintln!(
            "{} {} repositories (no usage check)",
            "Scanning".cyan(),
            config.repositories.len()
        );
    }

    let (candidates, report) = OrphanScan::new(config, &store).candidates_only().await;

    println!(
        "{} leaf model candidate(s) across {} node(s):",
        candidates.len(),
        report.summary.nodes
    );
    for candidate in &candidates {
        println!(
            "  {}  {}.{}.{}",
            candidate.node_id.bold(),
            candidate.relation.database,
            candidate.relation.schema,
            candidate.relation.alias
        );
    }

    print_diagnostics(&report, verbose);

    Ok(())
}

/// Decode one id against the configured repository set
fn parse_command(config: &Config, id: &str) -> Result<()> {
    let parser = IdentifierParser::new(config.repositories.iter().cloned());
    let attrs = parser.parse(id)?;

    println!("{}      {}", "kind:".bold(), attrs.resource_kind);
    println!("{}      {}", "repo:".bold(), attrs.owning_repository);
    if let Some(reference) = &attrs.source_reference {
        println!("{} {}", "reference:".bold(), reference);
    }
    println!("{}      {}", "name:".bold(), attrs.file_name);
    println!("{}  {}", "join key:".bold(), attrs.join_key);

    Ok(())
}

fn print_report(report: &OrphanReport, verbose: bool) {
    let summary = &report.summary;
    eprintln!(
        "{} {} nodes, {} inferred edge(s), {} candidate(s)",
        "Stitched".cyan(),
        summary.nodes,
        summary.edges_inferred,
        summary.candidates
    );

    if report.orphans.is_empty() {
        println!("{}", "No orphaned tables found.".green());
    } else {
        println!(
            "{} orphaned table(s) with zero queries and zero users in {} days:",
            report.orphans.len(),
            report.window_days
        );
        for orphan in &report.orphans {
            println!(
                "  {}  {}.{}.{}",
                orphan.node_name.bold(),
                orphan.database,
                orphan.schema,
                orphan.alias
            );
        }
    }

    if !report.unknown.is_empty() {
        println!(
            "{} {} candidate(s) with unknown usage (excluded from the list):",
            "!".yellow(),
            report.unknown.len()
        );
        for unknown in &report.unknown {
            println!("  {}  {}", unknown.node_name, unknown.reason.dimmed());
        }
    }

    print_diagnostics(report, verbose);
}

fn print_diagnostics(report: &OrphanReport, verbose: bool) {
    let errors = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = report.diagnostics.len() - errors;

    if errors + warnings > 0 {
        eprintln!(
            "{} {} error(s), {} warning(s) during scan",
            "Diagnostics:".yellow(),
            errors,
            warnings
        );
    }

    if verbose {
        for diagnostic in &report.diagnostics {
            let tag = match diagnostic.severity {
                Severity::Error => diagnostic.code.to_string().red(),
                Severity::Warn => diagnostic.code.to_string().yellow(),
                Severity::Info => diagnostic.code.to_string().normal(),
            };
            match &diagnostic.subject {
                Some(subject) => eprintln!("  [{}] {}: {}", tag, subject, diagnostic.message),
                None => eprintln!("  [{}] {}", tag, diagnostic.message),
            }
        }
    }
}
