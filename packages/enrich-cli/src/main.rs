mod config;
mod input;
mod sink;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use price_extraction::{
    ai::OpenAiAnalyzer, pipeline::load_route_file, BatchRunner, DomainRouter,
    EscalationController, HttpBrowser, PipelineConfig, ResultSink,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use sink::JsonLinesSink;

/// Fill in ETF/ETN prices and outstanding-share counts from issuer pages.
#[derive(Parser, Debug)]
#[command(name = "etf-enrich", version)]
struct Cli {
    /// TSV of `url<TAB>label;label` lines
    #[arg(short, long)]
    input: PathBuf,

    /// Write JSON lines here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra route catalog (JSON), may be repeated
    #[arg(long = "routes")]
    routes: Vec<PathBuf>,

    /// Never consult the AI tier
    #[arg(long)]
    no_ai: bool,

    /// Page load timeout, overrides ENRICH_LOAD_TIMEOUT_SECS
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,price_extraction=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let requests = input::read_requests(&cli.input)?;
    tracing::info!(count = requests.len(), input = %cli.input.display(), "requests loaded");

    // Route files go first so they win ties against the built-in catalog
    let mut builder = DomainRouter::builder();
    for path in &cli.routes {
        let specs = load_route_file(path)
            .with_context(|| format!("Failed to load routes from {}", path.display()))?;
        tracing::info!(routes = specs.len(), file = %path.display(), "route catalog loaded");
        builder = builder.with_specs(specs);
    }
    builder = builder.with_builtin_catalog();

    let use_ai = !cli.no_ai && config.openai_api_key.is_some();
    if !cli.no_ai {
        match &config.openai_api_key {
            Some(key) => {
                let analyzer =
                    OpenAiAnalyzer::new(key.expose()).with_model(config.openai_model.clone());
                builder = builder.with_analyzer(Arc::new(analyzer));
            }
            None => tracing::warn!("OPENAI_API_KEY not set, AI fallback disabled"),
        }
    }

    let router = builder.build().context("Failed to build route table")?;
    tracing::info!(routes = router.len(), ai = router.has_ai(), "router ready");

    let timeout = Duration::from_secs(cli.timeout_secs.unwrap_or(config.load_timeout_secs));
    let pipeline = PipelineConfig::new()
        .with_load_timeout(timeout)
        .with_ai_fallback(use_ai);
    let runner = BatchRunner::new(EscalationController::new(Arc::new(router), pipeline));

    let mut browser = HttpBrowser::new().context("Failed to start HTTP browser")?;
    if let Some(agent) = &config.user_agent {
        browser = browser.with_user_agent(agent.clone());
    }

    let mut sink: Box<dyn ResultSink> = match &cli.output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(JsonLinesSink::new(tokio::io::BufWriter::new(file)))
        }
        None => Box::new(JsonLinesSink::new(tokio::io::stdout())),
    };

    let summary = runner
        .run(&mut browser, requests, sink.as_mut())
        .await
        .context("Batch aborted")?;

    eprintln!();
    eprintln!("{}", "Batch complete".bright_green().bold());
    eprintln!("  run:       {}", summary.run_id.to_string().bright_black());
    eprintln!("  processed: {}", summary.processed);
    eprintln!("  succeeded: {}", summary.succeeded.to_string().green());
    eprintln!("  failed:    {}", summary.failed.to_string().red());
    eprintln!("  duration:  {:.1}s", summary.duration().as_secs_f64());

    Ok(())
}
