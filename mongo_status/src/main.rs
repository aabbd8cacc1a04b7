use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::interval;

use mongo_status::api;
use mongo_status::checks::dns::HickoryLookup;
use mongo_status::db::{ClientPool, MongoClientFactory};
use mongo_status::log_buffer::RollingLog;
use mongo_status::metrics::ProbeMetrics;
use mongo_status::report::ReportBuilder;
use mongo_status::settings::Settings;

#[derive(Parser)]
#[clap(about = "MongoDB connection status dashboard", version, author)]
struct Args {
    /// Path to the config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Run one probe cycle, print the report and exit
    #[clap(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env is optional, real environment wins
    let dotenv = dotenvy::dotenv();
    env_logger::init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    let args = Args::parse();

    let settings = Settings::load(&args.config.unwrap_or(PathBuf::from("config.yaml")))?;

    let metrics = Arc::new(ProbeMetrics::new());
    let pool = Arc::new(ClientPool::new(Arc::new(MongoClientFactory)));
    let dns = Arc::new(HickoryLookup::new(settings.timeout())?);
    let log = Arc::new(RollingLog::new(settings.log_capacity));
    let builder = Arc::new(ReportBuilder::new(
        settings.clone(),
        pool,
        dns,
        log,
        metrics.clone(),
    ));

    if args.once {
        let report = builder.run_cycle().await;
        print!("{}", report.render_text());
        return Ok(if report.ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    info!(
        "Status dashboard starting: tier={:?} timeout={}ms refresh={}s",
        settings.tier, settings.timeout_ms, settings.refresh_secs
    );

    if let Some(secs) = settings.background_interval_secs {
        let builder = builder.clone();
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(secs.max(1)));
            loop {
                timer.tick().await;
                let report = builder.clone().run_cycle().await;
                if report.ok() {
                    info!("[PASS] {}", report.probe.details);
                } else {
                    warn!("[FAIL] {}: {}", report.probe.message, report.probe.details);
                }
            }
        });
    }

    let ip: SocketAddr = settings
        .listen
        .parse()
        .context("Invalid listen address")?;
    let listener = TcpListener::bind(ip).await?;
    info!("Listening on {}", ip);

    let router = api::routes(builder, metrics);
    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await
    {
        error!("Server error: {}", e);
    }

    Ok(ExitCode::SUCCESS)
}
