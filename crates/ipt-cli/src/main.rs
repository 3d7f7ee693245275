use anyhow::Context;
use clap::{Parser, Subcommand};
use ipt_core::{ExporterConfig, SaveParser, Tables, summarize};
use ipt_metrics::Scraper;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iptables-exporter")]
#[command(version, about = "iptables packet and byte counters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a saved dump and show what it contains
    Parse {
        /// Dump produced by `iptables-save -c` (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Print the parsed tables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the save commands once and print the metrics
    Scrape {
        /// Exporter config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, json } => handle_parse(file, json)?,
        Commands::Scrape { config } => {
            tokio::runtime::Runtime::new()?.block_on(async { handle_scrape(config).await })?;
        }
    }

    Ok(())
}

fn handle_parse(file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let tables = match &file {
        Some(path) => {
            let f = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {:?}", path))?;
            parse_verbose(std::io::BufReader::new(f))?
        }
        None => parse_verbose(std::io::stdin().lock())?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    for summary in summarize(&tables) {
        println!(
            "{}: {} chains, {} rules ({} packets, {} bytes matched by rules)",
            summary.name,
            summary.chains,
            summary.rules,
            summary.rule_packets,
            summary.rule_bytes
        );
    }
    Ok(())
}

// Logs every bad line before failing with the first one.
fn parse_verbose<R: BufRead>(reader: R) -> anyhow::Result<Tables> {
    let mut parser = SaveParser::new();
    for line in reader.lines() {
        parser.handle_line(&line.context("Failed to read save output")?);
    }

    for err in parser.errors() {
        warn!("{}", err);
    }
    let lines = parser.lines_read();
    let tables = parser.finish()?;
    info!(lines, tables = tables.len(), "parsed save output");
    Ok(tables)
}

async fn handle_scrape(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => ExporterConfig::from_file(&path)?,
        None => ExporterConfig::default(),
    };

    let scraper = Scraper::from_config(&config)?;
    let outcome = scraper.scrape().await;

    // Metrics are printed either way; iptables_scrape_success tells them apart.
    print!("{}", scraper.collector().render_metrics()?);
    outcome
}
