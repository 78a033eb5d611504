use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use clap::Parser;

mod aggregation;
mod alerts;
mod config;
mod database;
mod error;
mod monitoring;
mod pool;
mod routes;

use aggregation::Aggregator;
use alerts::{AlertSink, LogSink, WebhookSink};
use config::Config;
use database::{LibsqlStore, Store};
use monitoring::prober::HttpProber;
use monitoring::{CheckCycleRunner, Probe, Scheduler};
use pool::{LibsqlManager, LibsqlPool};
use routes::AppState;

#[derive(Debug, Parser)]
#[command(name = "pulsewatch-service", about = "HTTP endpoint uptime monitoring service")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_deref()).context("failed to load config")?;
    tracing::debug!("{config}");

    let pool = build_pool(&config.database.path).await?;
    {
        let conn = pool.get().await?;
        database::initialize_database(&conn).await?;
    }

    let store: Arc<dyn Store> = Arc::new(LibsqlStore::new_from_pool(pool));

    let prober: Arc<dyn Probe> = Arc::new(HttpProber::new(config.monitor.probe_timeout_seconds)?);
    let sink: Arc<dyn AlertSink> = match &config.alerts.webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url)?),
        None => {
            tracing::warn!("no alert webhook configured, alerts will only be logged");
            Arc::new(LogSink)
        }
    };

    let runner = Arc::new(CheckCycleRunner::new(
        Arc::clone(&store),
        prober,
        sink,
        config.monitor.alert_threshold,
        config.monitor.probe_concurrency,
    ));

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&runner),
        Duration::from_secs(config.monitor.check_interval_seconds),
    ));
    scheduler.start().await;

    let aggregator = Aggregator::new(Arc::clone(&store), config.reporting.utc_offset_minutes)?;

    if config.server.cron_secret.is_none() {
        tracing::warn!("server.cron_secret is unset, trigger routes will reject every request");
    }

    let state = web::Data::new(AppState {
        store,
        runner,
        scheduler: Arc::clone(&scheduler),
        aggregator,
        cron_secret: config.server.cron_secret.clone(),
    });

    let addr = (config.server.bind.clone(), config.server.port);
    tracing::info!("listening on {}:{}", addr.0, addr.1);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    // Graceful shutdown: no new cycles; an in-flight one may finish.
    scheduler.stop().await;
    Ok(())
}

async fn build_pool(db_path: &str) -> Result<LibsqlPool> {
    let db = libsql::Builder::new_local(db_path).build().await?;
    let manager = LibsqlManager::new(db);
    let pool = deadpool::managed::Pool::builder(manager)
        .config(deadpool::managed::PoolConfig::default())
        .build()?;
    Ok(pool)
}
