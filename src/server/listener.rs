//! HTTP/WebSocket listener and server main loop

use super::http;
use super::hub::Hub;
use super::AppState;
use crate::config::Config;
use crate::relay::Relay;
use anyhow::Result;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn create_app(state: AppState, allow_any_origin: bool) -> Router {
    let cors = if allow_any_origin {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE])
            .allow_origin(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route(
            "/api/sessions",
            get(http::list_sessions).post(http::create_session),
        )
        .route("/api/sessions/stop", post(http::stop_session))
        .route("/api/sessions/authorize", post(http::authorize_viewer))
        .route("/ws", get(http::ws_handler))
        .route("/health", get(http::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Signaling relay server
pub struct ServerListener {
    addr: SocketAddr,
    allow_any_origin: bool,
    state: AppState,
}

impl ServerListener {
    /// Create a new server listener from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let hub = Arc::new(Hub::new());
        let relay = Relay::new(hub).with_default_name(config.sessions.default_name.clone());

        Ok(Self {
            addr: config.socket_addr()?,
            allow_any_origin: config.server.allow_any_origin,
            state: AppState {
                relay: Arc::new(relay),
                outbound_buffer: config.transport.outbound_buffer.max(1),
            },
        })
    }

    /// Configured listen address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared relay handle
    pub fn relay(&self) -> &Arc<Relay<Hub>> {
        &self.state.relay
    }

    /// Application router bound to this server's state
    pub fn router(&self) -> Router {
        create_app(self.state.clone(), self.allow_any_origin)
    }

    /// Bind the configured address and run until shutdown
    pub async fn run(&self, shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_rx).await
    }

    /// Run on an already bound listener until shutdown
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Signaling relay listening on http://{}", local_addr);
        tracing::info!("WebSocket endpoint at ws://{}/ws", local_addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(
            "Server stopped with {} active sessions",
            self.state.relay.registry().len()
        );
        Ok(())
    }
}
