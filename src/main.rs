// SPDX-License-Identifier: PMPL-1.0-or-later
//! accessscan CLI - HTML accessibility scanner
//!
//! Analyses HTML files, manages the saved report history and runs the URL
//! fetch proxy.

use accessscan::aggregate::{self, FindingFilter};
use accessscan::api::{self, AppState};
use accessscan::export::{self, Artifact, ExportFormat};
use accessscan::finding::{Report, Severity};
use accessscan::scanner;
use accessscan::store::{NewReport, ReportStore, StorageBackend};
use accessscan::Config;
use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// HTML accessibility scanner with report history and export
#[derive(Parser)]
#[command(name = "accessscan")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = accessscan::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an HTML file (`-` reads stdin)
    Analyze {
        /// HTML file to analyze
        input: String,

        /// Title used when saving the report
        #[arg(long)]
        title: Option<String>,

        /// Save the result to the report store
        #[arg(long)]
        save: bool,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,

        /// Output file (stdout if not specified; PDF defaults to a dated file)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Start the URL fetch proxy
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage saved reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// List saved reports, newest first
    List,

    /// Print one report as text
    Show { id: String },

    /// Delete one report
    Delete { id: String },

    /// Delete every report
    Clear,

    /// Find reports by title or analysed markup
    Search { query: String },

    /// Reports saved in the last DAYS days
    Recent {
        #[arg(value_parser = clap::value_parser!(i64).range(0..))]
        days: i64,
    },

    /// Export all reports as a JSON bundle
    Export {
        /// Output file (defaults to a dated file name)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import reports from a JSON bundle
    Import { file: PathBuf },

    /// Show storage usage
    Usage,

    /// Show aggregate statistics
    Stats {
        /// Window for the recent activity count
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(i64).range(0..))]
        days: i64,
    },

    /// Render a saved report in any export format
    Render {
        id: String,

        /// Output format
        #[arg(long, default_value = "pdf")]
        format: FormatArg,

        /// Output file
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Narrow the exported findings
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only findings of this severity
    #[arg(long)]
    severity: Option<SeverityArg>,

    /// Only findings of this rule id
    #[arg(long = "rule")]
    rule_id: Option<String>,
}

impl From<FilterArgs> for FindingFilter {
    fn from(args: FilterArgs) -> Self {
        FindingFilter {
            severity: args.severity.map(Severity::from),
            rule_id: args.rule_id,
        }
    }
}

/// Severity CLI argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SeverityArg {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Critical => Severity::Critical,
            SeverityArg::Serious => Severity::Serious,
            SeverityArg::Moderate => Severity::Moderate,
            SeverityArg::Minor => Severity::Minor,
        }
    }
}

/// Export format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Plain-text report
    Text,
    /// One row per offending element
    Csv,
    /// Analysis result as JSON
    Json,
    /// Paginated PDF report
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ExportFormat::Text,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

type Store = ReportStore<Box<dyn StorageBackend>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            input,
            title,
            save,
            format,
            output,
            filter,
        } => {
            let has_findings = analyze(
                &config,
                &input,
                title,
                save,
                format.into(),
                output,
                &filter.into(),
            )
            .await?;
            if has_findings {
                std::process::exit(1);
            }
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(&config, &host, port).await?;
        }

        Commands::Reports { command } => {
            let store = open_store(&config).await?;
            let outcome = reports(&store, command).await;
            store.close().await?;
            outcome?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "accessscan=debug"
    } else {
        "accessscan=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    let store = ReportStore::open(config.storage.backend(), config.storage.limits())
        .await
        .context("failed to open report store")?;
    Ok(store)
}

/// Run an analysis; returns whether any issue matching `filter` was found
///
/// The saved report always holds the full result.
async fn analyze(
    config: &Config,
    input: &str,
    title: Option<String>,
    save: bool,
    format: ExportFormat,
    output: Option<PathBuf>,
    filter: &FindingFilter,
) -> anyhow::Result<bool> {
    let markup = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        scanner::read_markup_file(Path::new(input), config.input.max_upload_bytes)?
    };

    let engine = config.engine.build();
    let result = scanner::analyze_markup(engine.as_ref(), &markup).await?;

    if save {
        let store = open_store(config).await?;
        let title = title.unwrap_or_else(|| NewReport::default_title(Utc::now()));
        let saved = store.save(NewReport::new(title, result.clone())).await;
        store.close().await?;
        eprintln!("Report saved with id {}", saved?);
    }

    let shown = aggregate::narrow(&result, filter);
    let artifact = export::export(&shown, format)?;
    write_artifact(&artifact, output.as_deref())?;

    Ok(!shown.is_empty())
}

async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config.engine.build(), config.server.expose_diagnostics);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn reports(store: &Store, command: ReportCommands) -> anyhow::Result<()> {
    match command {
        ReportCommands::List => print_reports(&store.list().await),

        ReportCommands::Show { id } => {
            let report = find_report(store, &id).await?;
            let findings = report.result.findings();
            println!("{}\n", report.title);
            print!("{}", export::to_plain_text(&report.result));
            if !findings.is_empty() {
                println!(
                    "\nRules ({} issue(s)): {}",
                    aggregate::total_occurrences(findings),
                    aggregate::distinct_rule_ids(findings).join(", ")
                );
            }
        }

        ReportCommands::Delete { id } => {
            if !store.delete(&id).await? {
                bail!("No report with id {}", id);
            }
            eprintln!("Deleted report {}", id);
        }

        ReportCommands::Clear => {
            store.clear().await?;
            eprintln!("All reports cleared");
        }

        ReportCommands::Search { query } => print_reports(&store.search(&query).await),

        ReportCommands::Recent { days } => print_reports(&store.filter_by_age(days).await),

        ReportCommands::Export { output } => {
            let bundle = store.export_all().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export::bundle_file_name(Utc::now())));
            std::fs::write(&path, bundle)?;
            eprintln!("Reports exported to {}", path.display());
        }

        ReportCommands::Import { file } => {
            let data = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let outcome = store.import_bundle(&data).await?;
            println!(
                "Imported {} report(s), skipped {} duplicate(s); {} report(s) stored",
                outcome.imported, outcome.skipped, outcome.total
            );
        }

        ReportCommands::Usage => {
            let usage = store.usage().await;
            println!(
                "{} of {} used ({}%)",
                accessscan::store::format_bytes(usage.used_bytes),
                accessscan::store::format_bytes(usage.max_bytes),
                usage.percent_used
            );
        }

        ReportCommands::Stats { days } => {
            let stats = store.statistics(days).await;
            println!("Total reports: {}", stats.total_reports);
            println!("Total issues: {}", stats.total_issues);
            println!("Average issues per report: {}", stats.average_issues_per_report);
            println!("Reports in the last {} days: {}", days, stats.reports_in_last_n_days);
            if !stats.most_frequent_rule_ids.is_empty() {
                println!("Most frequent rules:");
                for entry in &stats.most_frequent_rule_ids {
                    println!("  {:<28} {}", entry.rule_id, entry.count);
                }
            }
        }

        ReportCommands::Render {
            id,
            format,
            output,
            filter,
        } => {
            let report = find_report(store, &id).await?;
            let shown = aggregate::narrow(&report.result, &filter.into());
            let artifact = export::export(&shown, format.into())?;
            write_artifact(&artifact, output.as_deref())?;
        }
    }

    Ok(())
}

async fn find_report(store: &Store, id: &str) -> anyhow::Result<Report> {
    match store.get(id).await {
        Some(report) => Ok(report),
        None => bail!("No report with id {}", id),
    }
}

fn print_reports(reports: &[Report]) {
    if reports.is_empty() {
        println!("No saved reports");
        return;
    }
    for report in reports {
        println!(
            "{}  {}  {:>4} issue(s)  {}",
            report.id,
            report.created_at_utc.format("%Y-%m-%d %H:%M"),
            report.total_issues(),
            report.title
        );
    }
}

/// Write an artifact to a file, or to stdout for text formats
fn write_artifact(artifact: &Artifact, path: Option<&Path>) -> anyhow::Result<()> {
    let path = match (path, artifact.format) {
        (Some(p), _) => p.to_path_buf(),
        (None, ExportFormat::Pdf) => PathBuf::from(&artifact.file_name),
        (None, _) => {
            println!("{}", String::from_utf8_lossy(&artifact.bytes));
            return Ok(());
        }
    };

    std::fs::write(&path, &artifact.bytes)?;
    eprintln!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_after_subcommand() {
        let cli = Cli::try_parse_from(["accessscan", "reports", "list", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));

        let cli = Cli::try_parse_from(["accessscan", "reports", "list"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(accessscan::config::DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_negative_days_rejected() {
        assert!(Cli::try_parse_from(["accessscan", "reports", "recent", "-1"]).is_err());
        assert!(Cli::try_parse_from(["accessscan", "reports", "stats", "--days", "-3"]).is_err());
        assert!(Cli::try_parse_from(["accessscan", "reports", "recent", "9999999999"]).is_ok());
    }

    #[test]
    fn test_filter_args() {
        let cli = Cli::try_parse_from([
            "accessscan",
            "analyze",
            "page.html",
            "--severity",
            "critical",
            "--rule",
            "image-alt-missing",
        ])
        .unwrap();
        let Commands::Analyze { filter, .. } = cli.command else {
            panic!("expected analyze");
        };
        let filter = FindingFilter::from(filter);
        assert_eq!(filter.severity, Some(Severity::Critical));
        assert_eq!(filter.rule_id.as_deref(), Some("image-alt-missing"));
    }
}
