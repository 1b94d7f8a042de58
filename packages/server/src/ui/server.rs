//! Server execution logic.

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{
    handler::{get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Timing knobs for the gateway's background tasks.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// How often expired typing indicators are swept.
    pub sweep_period: Duration,
    /// Inactivity window after which a connection is considered dead.
    pub liveness_window: Duration,
    /// How often the registry is scanned for dead connections.
    pub reap_period: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            sweep_period: Duration::from_secs(1),
            liveness_window: Duration::from_secs(45),
            reap_period: Duration::from_secs(10),
        }
    }
}

/// Realtime messaging gateway: WebSocket endpoint, a small HTTP API, and
/// the background sweeper/reaper tasks.
pub struct GatewayServer {
    state: Arc<AppState>,
    config: GatewayConfig,
}

impl GatewayServer {
    pub fn new(state: Arc<AppState>, config: GatewayConfig) -> Self {
        Self { state, config }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(websocket_handler))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    fn spawn_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let state = self.state.clone();
        let period = self.config.sweep_period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let expired = state.typing_usecase.sweep_expired().await;
                if expired > 0 {
                    tracing::debug!(expired, "typing sweep complete");
                }
            }
        })
    }

    fn spawn_reaper(&self) -> tokio::task::JoinHandle<()> {
        let state = self.state.clone();
        let period = self.config.reap_period;
        let window = self.config.liveness_window;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                for connection_id in state.registry.stale_connections(window).await {
                    tracing::info!(connection = %connection_id, "reaping dead connection");
                    state.disconnect_usecase.execute(&connection_id).await;
                }
            }
        })
    }

    /// Serve on an already-bound listener. Used directly by integration
    /// tests so they can bind to an ephemeral port.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let sweeper = self.spawn_sweeper();
        let reaper = self.spawn_reaper();

        tracing::info!(
            "support chat gateway listening on {}",
            listener.local_addr()?
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        reaper.abort();
        tracing::info!("gateway shutdown complete");

        Ok(())
    }

    /// Bind and run the gateway.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        self.serve(listener).await
    }
}
