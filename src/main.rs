use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use clusterwatch::config::{Config, ConfigLoader};
use clusterwatch::sink::DisplaySink;
use clusterwatch::{
    init_tracing, CachedCredentials, FileSink, LogSink, MultiSink, Poller, PrometheusClient,
    Severity, StaticCredentials,
};

/// Exit code for failures before the first poll (bad config, bad manifest).
const EXIT_STARTUP: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "clusterwatch")]
#[command(about = "Poll Prometheus and report cluster health", version)]
struct Args {
    /// Log per-metric results
    #[arg(short, long)]
    verbose: bool,

    /// Settings file (default: ./clusterwatch.{toml,yaml,json} if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metrics manifest, overrides the settings file
    #[arg(short, long, env = "CLUSTERWATCH_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Run a single poll cycle, print it as JSON and exit with the severity
    /// (0 OK, 1 DEGRADED, 2 CRITICAL, 3 UNKNOWN)
    #[arg(long)]
    once: bool,

    /// Also write every snapshot to this JSON file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("clusterwatch: {:#}", e);
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let result = if args.once {
        run_once(config, args.export).await
    } else {
        run(config, args.export).await.map(|()| ExitCode::SUCCESS)
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_STARTUP)
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.settings_file(path);
    }
    if let Some(path) = &args.manifest {
        loader = loader.manifest(path);
    }

    let mut config = loader.load()?;
    if args.insecure {
        config.insecure_skip_verify = true;
    }
    Ok(config)
}

fn build_client(config: &Config) -> Result<PrometheusClient> {
    let mut builder = PrometheusClient::builder()
        .endpoint(config.endpoint.clone())
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.insecure_skip_verify);

    if let Some(creds) = &config.credentials {
        builder = builder.credentials(CachedCredentials::new(
            StaticCredentials::from(creds.clone()),
            config.credential_refresh,
        ));
    }

    builder.build().context("building Prometheus client")
}

/// Single cycle for scripts and health checks.
async fn run_once(config: Config, export: Option<PathBuf>) -> Result<ExitCode> {
    let client = build_client(&config)?;
    let poller = Poller::new(Arc::new(config), client);

    let snapshot = poller.collect().await;
    if let Some(path) = export {
        FileSink::new(path).render(&snapshot)?;
    }
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(ExitCode::from(severity_code(snapshot.severity)))
}

/// Poll until Ctrl-C.
async fn run(config: Config, export: Option<PathBuf>) -> Result<()> {
    let client = build_client(&config)?;

    info!(
        endpoint = %config.endpoint,
        metrics = config.metrics.len(),
        "Polling every {}s",
        config.poll_period.as_secs()
    );

    let mut sink = MultiSink::new().with(LogSink::new(true));
    if let Some(path) = export {
        info!("Exporting snapshots to {}", path.display());
        sink.push(FileSink::new(path));
    }

    let handle = Poller::new(Arc::new(config), client).spawn(sink);

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("Shutting down");

    handle.stop().await?;
    Ok(())
}

fn severity_code(severity: Severity) -> u8 {
    match severity {
        Severity::Ok => 0,
        Severity::Degraded => 1,
        Severity::Critical => 2,
        Severity::Unknown => 3,
    }
}
