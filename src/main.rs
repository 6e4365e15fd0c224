use acsincome::{
    config::{self, Args, QueryConfig, KEY_ENV_VAR},
    export::{
        csv::write_csv_file,
        parquet::{write_parquet_file, Provenance},
    },
    fetch::{Credential, Fetcher, HttpFetcher},
    present, process, PipelineError,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::{env, process::ExitCode};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    // stdout carries the table and chart; logs go to stderr.
    let default_filter = if args.debug { "debug" } else { "info" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, args.debug),
    }
}

fn execute(args: &Args) -> Result<()> {
    // ─── 2) resolve query settings + key ─────────────────────────────
    let query_config = QueryConfig::from_args(args)?;
    let key = config::resolve_key(
        args.key.as_deref(),
        args.key_file.as_deref(),
        env::var(KEY_ENV_VAR).ok(),
    )?;

    let fetcher = HttpFetcher::new()?;
    fetch_and_export(args, &query_config, key.as_deref(), &fetcher, Utc::now())
}

/// Fetch → present → export. Nothing is printed or written unless the fetch
/// and normalization both succeed.
fn fetch_and_export(
    args: &Args,
    query_config: &QueryConfig,
    key: Option<&str>,
    fetcher: &dyn Fetcher,
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    // ─── 3) fetch, validate, normalize ───────────────────────────────
    let table = process::run(key, query_config, fetcher, args.sort)?;

    // ─── 4) present ──────────────────────────────────────────────────
    println!(
        "Median household income by county ({} {}, state {})\n",
        query_config.dataset, query_config.year, query_config.state
    );
    present::income_table(&table).printstd();
    if !args.no_chart {
        println!();
        print!(
            "{}",
            present::render_bar_chart(&table, present::DEFAULT_BAR_WIDTH)
        );
    }

    // ─── 5) export ───────────────────────────────────────────────────
    write_csv_file(&table, &args.out)?;
    if let Some(path) = &args.parquet {
        let source_url = query_config
            .query(Credential::from_option(key)?)
            .redacted_url()?
            .to_string();
        let provenance = Provenance {
            fetched_at,
            source_url,
        };
        write_parquet_file(&table, path, &provenance)?;
    }

    info!(rows = table.len(), missing = table.missing_count(), "all done");
    Ok(())
}

/// Configuration problems are warnings (exit 2); everything else is an error
/// (exit 1). A failed fetch or parse leaves stdout and the output files untouched.
fn report(err: &anyhow::Error, debug: bool) -> ExitCode {
    match err.downcast_ref::<PipelineError>() {
        Some(e) if e.is_config() => {
            eprintln!("warning: {}", e);
            ExitCode::from(2)
        }
        Some(e) => {
            eprintln!("error: {}", e);
            if debug {
                if let Some(body) = e.raw_body() {
                    eprintln!("--- response body ---\n{}", body);
                }
            }
            ExitCode::FAILURE
        }
        None => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
