//! Command-line interface for concord
//!
//! # Usage
//!
//! ```bash
//! concord analyze ACME --data fixtures/acme.json --format table
//! CONCORD_LOG_FORMAT=json concord analyze ACME GLOBX --data fixtures/market.json
//! ```

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use concord_analysis::{
    AnalysisError, AnalysisPipeline, AnalysisReport, FixtureSource, PipelineConfig,
};
use concord_core::Signal;
use concord_utils::{LogFormat, Settings, init_tracing_with_level, load_json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(about = "Multi-perspective trading recommendations", long_about = None)]
struct Args {
    /// Log output format, overrides CONCORD_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one or more symbols from recorded snapshots
    Analyze {
        /// Symbols to analyse
        #[arg(required = true)]
        symbols: Vec<String>,

        /// JSON file with snapshots per symbol
        #[arg(short, long)]
        data: PathBuf,

        /// JSON file overriding the pipeline configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

fn signal_cell(signal: &Signal) -> String {
    format!("{} {:.2}", signal.direction, signal.strength)
}

fn price_cell(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"))
}

fn render_table(reports: &[AnalysisReport]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Symbol",
            "Action",
            "Confidence",
            "Buy",
            "Target",
            "Stop",
            "Risk",
            "Opportunity",
            "Technical",
            "Fundamental",
            "Sentiment",
        ]);
    for report in reports {
        let decision = &report.decision;
        table.add_row(vec![
            report.symbol.clone(),
            decision.action.to_string(),
            format!("{:.2}", decision.confidence),
            price_cell(decision.buy_price),
            price_cell(decision.target_price),
            price_cell(decision.stop_loss_price),
            report.outlook.risk.level.to_string(),
            report.outlook.opportunity.level.to_string(),
            signal_cell(&report.signals.technical),
            signal_cell(&report.signals.fundamental),
            signal_cell(&report.signals.sentiment),
        ]);
    }

    let mut output = table.to_string();
    for report in reports {
        output.push_str(&format!("\n\n{}:", report.symbol));
        for line in &report.decision.rationale {
            output.push_str(&format!("\n  - {line}"));
        }
    }
    output
}

/// Symbol whose analysis could not run
#[derive(Debug)]
struct Failure {
    symbol: String,
    error: AnalysisError,
}

/// Split batch results into reports and per-symbol failures, keeping order
fn partition(
    symbols: &[String],
    results: Vec<concord_analysis::Result<AnalysisReport>>,
) -> (Vec<AnalysisReport>, Vec<Failure>) {
    let mut reports = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(error) => failures.push(Failure {
                symbol: symbol.clone(),
                error,
            }),
        }
    }
    (reports, failures)
}

async fn analyze(
    symbols: &[String],
    data: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let source: FixtureSource = load_json(&data)?;
    let config = match config {
        Some(path) => load_json::<PipelineConfig>(&path)?,
        None => PipelineConfig::default(),
    };
    let pipeline = AnalysisPipeline::new(Arc::new(source), config)
        .context("invalid pipeline configuration")?;

    info!(count = symbols.len(), "Analysing symbols");
    let (reports, failures) = partition(symbols, pipeline.analyze_batch(symbols).await);
    for failure in &failures {
        error!(symbol = %failure.symbol, error = %failure.error, "Analysis failed");
    }

    match format {
        OutputFormat::Json => {
            let mut entries: Vec<_> = reports
                .iter()
                .map(|r| serde_json::json!({ "symbol": r.symbol, "decision": r.decision }))
                .collect();
            entries.extend(failures.iter().map(|f| {
                serde_json::json!({ "symbol": f.symbol, "error": f.error.to_string() })
            }));
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Table => {
            if !reports.is_empty() {
                println!("{}", render_table(&reports));
            }
            for failure in &failures {
                eprintln!("{:?}: {}", failure.symbol, failure.error);
            }
        }
    }

    if reports.is_empty() && !failures.is_empty() {
        anyhow::bail!("no symbol could be analysed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let settings = Settings::from_env()?;
    let log_format = args.log_format.unwrap_or(settings.log_format);
    init_tracing_with_level(log_format, &settings.log_level);

    info!(app = %settings.app_name, "Starting concord");

    match args.command {
        Command::Analyze {
            symbols,
            data,
            config,
            format,
        } => analyze(&symbols, data, config, format).await,
    }
}
