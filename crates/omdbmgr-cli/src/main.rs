//! omdbmgr - search OMDb for movies with posters.

/// Application configuration (TOML).
mod config;
/// Console output of search results.
mod present;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::AppConfig;
use omdbmgr_api::omdb::{OmdbClient, SearchTerm, search_all};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Print the sorted result as JSON on stdout (logs go to stderr).
    #[arg(long)]
    json: bool,

    /// Search words, joined with '+' (e.g. `star wars`).
    terms: Vec<String>,
}

/// Log output target: stderr keeps stdout clean for `--json`.
fn log_writer(json: bool) -> BoxMakeWriter {
    if json {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    }
}

/// Installs the global tracing subscriber.
fn init_tracing(json: bool) {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_writer(log_writer(json))
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(log_writer(json));

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }
}

/// Builds the API client from config overrides.
///
/// # Errors
///
/// Returns an error if the configured base URL is invalid or the client
/// fails to build.
fn build_client(config: &AppConfig) -> Result<OmdbClient> {
    let user_agent = config.api.user_agent.clone().unwrap_or_else(|| {
        String::from(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
    });

    let mut builder = OmdbClient::builder().user_agent(user_agent);
    if let Some(url) = config.api.parsed_base_url()? {
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build API client")
}

/// Runs one search and prints the merged result.
///
/// # Errors
///
/// Returns an error if no search word is given, the config cannot be
/// loaded, or the first request fails.
#[instrument(skip_all)]
async fn run_search(cli: &Cli) -> Result<()> {
    let term =
        SearchTerm::from_tokens(cli.terms.iter().cloned()).context("you must enter one movie")?;
    tracing::info!("searching for: {term}");

    let config = AppConfig::load_for(cli.dir.as_deref())?;
    let client = build_client(&config)?;

    let started = Instant::now();
    let report = search_all(&client, &term)
        .await
        .with_context(|| format!("search for '{term}' failed"))?;
    tracing::info!("search completed in [{}ms]", started.elapsed().as_millis());

    if cli.json {
        present::write_json(std::io::stdout().lock(), &report)?;
    } else {
        present::print_report(&term.to_string(), &report);
    }

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if the search fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);
    run_search(&cli).await
}
