#![warn(clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use hostping_service::config::Settings;
use hostping_service::{
    FileConfigProvider, LibsqlResultStore, ProbeScheduler, ResultStore, RetentionCleanup,
    RetentionPolicy,
};
use tracing::info;

mod error;
mod routes;
mod state;

use error::AppError;
use logger::init_tracing;
use state::AppState;

/// Periodic host reachability monitor
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to settings.toml (defaults to $XDG_CONFIG_HOME/hostping/settings.toml)
    #[arg(long, env = "HOSTPING_SETTINGS")]
    settings: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let settings = Settings::from_config(args.settings.as_deref())?;
    info!("{}", settings);

    let store: Arc<dyn ResultStore> = Arc::new(
        LibsqlResultStore::open(&settings.database.path, settings.database.write_timeout())
            .await
            .map_err(AppError::Store)?,
    );

    let provider = FileConfigProvider::new(&settings.probe.config_path);
    let probe_config = provider.load_or_create()?;

    let executor = Arc::new(settings.probe.executor());
    info!("Probe method: {}", executor.method());
    let scheduler = Arc::new(ProbeScheduler::new(executor, Arc::clone(&store), probe_config));

    let retention_handle = settings.retention.enabled.then(|| {
        let policy = RetentionPolicy { result_days: settings.retention.result_days };
        info!("Retention enabled: keeping {} days of results", policy.result_days);
        RetentionCleanup::new(Arc::clone(&store), policy)
            .start_periodic_cleanup(settings.retention.cleanup_interval())
    });

    if settings.probe.autostart {
        scheduler.start_current().await?;
    }

    let state = web::Data::new(AppState::new(
        Arc::clone(&scheduler),
        store,
        provider,
        settings.server.max_query_results,
    ));

    let result = run_server(state, &settings.server.bind, settings.server.port).await;

    info!("Shutting down probe scheduler");
    scheduler.shutdown().await;
    if let Some(handle) = retention_handle {
        handle.abort();
    }

    result
}

async fn run_server(state: web::Data<AppState>, bind: &str, port: u16) -> Result<(), AppError> {
    info!("Listening on {}:{}", bind, port);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes::routes))
        .bind((bind, port))?
        .run()
        .await?;

    Ok(())
}
