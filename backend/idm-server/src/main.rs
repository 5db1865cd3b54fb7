use idm_auth::{AdminCredentials, Authorizer, Bakery};
use idm_config::Config;
use idm_server::{AppState, build_router, logger, telemetry};
use idm_store::{
    CollectionMonitor, GroupDirectory, IdentityCounter, LaunchpadDirectory, NoDirectory,
    StoreParams, open_store_pool,
};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::net::TcpListener;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    config.validate()?;

    let log_file_path = match &config.logging.file {
        Some(filename) => Some(Config::config_dir()?.join(filename)),
        None => None,
    };
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting idm-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let metrics = telemetry::install_recorder()?;

    let directory: Arc<dyn GroupDirectory> = match &config.directory.launchpad_url {
        Some(url) => {
            info!("External groups from {}", url);
            Arc::new(LaunchpadDirectory::new(Url::parse(url)?))
        }
        None => Arc::new(NoDirectory),
    };

    let pool = open_store_pool(StoreParams {
        database_path: config.database_path()?,
        max_sessions: config.pool.max_sessions,
        request_timeout: config.pool.request_timeout(),
        directory,
    })
    .await?;

    let bakery = match config.auth.root_key_bytes()? {
        Some(root_key) => Bakery::new(&config.server.location, root_key),
        None => {
            warn!("No auth.root_key configured; macaroons will not survive a restart");
            Bakery::with_random_key(&config.server.location)
        }
    };
    let authorizer = Authorizer::new(
        AdminCredentials::new(&config.auth.admin_username, &config.auth.admin_password),
        Arc::new(bakery),
    );

    let reporter = (config.server.collection_report_secs > 0).then(|| {
        let monitor = CollectionMonitor::new()
            .with_counter("identities", Arc::new(IdentityCounter::new(pool.clone())));
        telemetry::spawn_collection_reporter(
            monitor,
            Duration::from_secs(config.server.collection_report_secs),
        )
    });

    let state = AppState::new(pool.clone(), Arc::new(authorizer)).with_metrics(metrics);
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received SIGINT (Ctrl+C), shutting down"),
                Err(e) => {
                    error!("Failed to listen for SIGINT: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    pool.close();
    info!("Shutdown complete");

    Ok(())
}
