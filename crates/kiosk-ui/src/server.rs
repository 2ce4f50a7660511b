//! WebSocket endpoint the kiosk UI connects to.
//!
//! # Architecture
//!
//! ```text
//! Browser UI ──ws /ws/ui──> websocket_handler ──> run_connection
//!                                                   │    │
//!                                       EventBus <──┘    └──> UiHub (fan-out)
//! ```
//!
//! A connection that stays silent for longer than the idle timeout is
//! closed; the UI pings regularly, so silence means it is gone. On server
//! shutdown each connection is sent `loading` before it closes, so the
//! screen waits for the kiosk to come back.
//!
//! # Example Usage
//!
//! ```no_run
//! use kiosk_ui::{UiHub, UiServer, UiServerConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hub = Arc::new(UiHub::new());
//! let server = UiServer::bind(UiServerConfig::default(), hub).await?;
//! server.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

use crate::bus::{EventBus, Responder, UiSink, ping_listener};
use crate::hub::UiHub;
use crate::protocol::{Outbound, UiEvent};
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use kiosk_core::constants::{DEFAULT_UI_IDLE_TIMEOUT_MS, UI_WEBSOCKET_PATH};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for the UI server
#[derive(Debug, Clone)]
pub struct UiServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Close a connection after this long without any inbound frame
    pub idle_timeout: Duration,
}

impl Default for UiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8081)),
            idle_timeout: Duration::from_millis(DEFAULT_UI_IDLE_TIMEOUT_MS),
        }
    }
}

/// Errors that can occur while serving the UI
#[derive(Debug, Error)]
pub enum UiServerError {
    /// Failed to bind to address
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone)]
struct ServerState {
    hub: Arc<UiHub>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
}

/// Bound UI server, ready to run.
pub struct UiServer {
    listener: TcpListener,
    hub: Arc<UiHub>,
    config: UiServerConfig,
}

impl UiServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is already in use or not available.
    pub async fn bind(config: UiServerConfig, hub: Arc<UiHub>) -> Result<Self, UiServerError> {
        let listener =
            TcpListener::bind(config.bind_addr)
                .await
                .map_err(|source| UiServerError::BindFailed {
                    addr: config.bind_addr,
                    source,
                })?;

        info!(addr = %config.bind_addr, path = UI_WEBSOCKET_PATH, "UI server bound");

        Ok(Self {
            listener,
            hub,
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, UiServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// Open UI connections are closed as part of the shutdown.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), UiServerError> {
        let app = router(self.hub, self.config.idle_timeout, shutdown.clone());

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("UI server stopped");
        Ok(())
    }
}

fn router(hub: Arc<UiHub>, idle_timeout: Duration, shutdown: CancellationToken) -> Router {
    Router::new()
        .route(UI_WEBSOCKET_PATH, get(websocket_handler))
        .with_state(ServerState {
            hub,
            idle_timeout,
            shutdown,
        })
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        run_connection(sink, stream, state.hub, state.idle_timeout, state.shutdown).await;
    })
}

/// Drive one UI connection until it closes, idles out, or the server stops.
pub async fn run_connection<S, R, E>(
    mut sink: S,
    mut stream: R,
    hub: Arc<UiHub>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: std::fmt::Display + Send,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let responder = Responder::new(tx);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message.to_json() {
                Ok(text) => {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!(error = %e, "Failed to serialize UI message"),
            }
        }
        let _ = sink.close().await;
    });

    let mut bus = EventBus::new(responder.clone());
    bus.listen(ping_listener());
    let id = hub.register(responder);
    bus.push_ui(UiEvent::Waiting);

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(connection = %id, "Closing UI connection for shutdown");
                bus.push_ui(UiEvent::Loading);
                break;
            }
            next = tokio::time::timeout(idle_timeout, stream.next()) => next,
        };

        match next {
            Err(_) => {
                warn!(connection = %id, timeout = ?idle_timeout, "UI connection idle, closing");
                break;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Err(e))) => {
                warn!(connection = %id, error = %e, "UI connection error");
                break;
            }
            Ok(Some(Ok(Message::Text(text)))) => {
                bus.handle_message(text.as_str());
            }
            Ok(Some(Ok(_))) => {}
        }
    }

    hub.unregister(id);
    drop(bus);
    let _ = writer.await;
}
