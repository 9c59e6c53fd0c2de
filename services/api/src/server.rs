use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::ServeArgs;
use crate::infra::{shutdown_signal, spawn_auth_event_logger, AppState};
use crate::routes::with_marketplace_routes;
use anna_rental::config::AppConfig;
use anna_rental::error::AppError;
use anna_rental::identity::{IdentityProvider, LocalIdentityProvider};
use anna_rental::marketplace::Marketplace;
use anna_rental::storage::{open_account_store, open_stores};
use anna_rental::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = Some(data_dir);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (listings, bookings) = open_stores(&config.storage)?;
    let accounts = open_account_store(&config.storage)?;
    let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::with_store(
        &config.identity,
        accounts,
    )?);
    let auth_events = spawn_auth_event_logger(identity.subscribe());
    let marketplace = Marketplace::new(identity, listings, bookings);

    let app = with_marketplace_routes(
        &marketplace,
        config.environment.exposes_verification_codes(),
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = ?config.storage.data_dir,
        "rental marketplace ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    auth_events.abort();
    info!("rental marketplace stopped");
    Ok(())
}
