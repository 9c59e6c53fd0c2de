use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anna_rental::identity::AuthEvent;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Log auth-state changes until the provider drops its sender or the task is aborted.
pub(crate) fn spawn_auth_event_logger(
    mut events: broadcast::Receiver<AuthEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthEvent::Registered { user_id, role }) => {
                    info!(%user_id, %role, "account registered")
                }
                Ok(AuthEvent::EmailVerified { user_id }) => info!(%user_id, "email verified"),
                Ok(AuthEvent::SignedIn { user_id }) => info!(%user_id, "signed in"),
                Ok(AuthEvent::SignedOut { user_id }) => info!(%user_id, "signed out"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "auth event log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub(crate) async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
