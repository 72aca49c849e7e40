//! Accept loop: wires the transport to the dispatcher.

use parlor_protocol::{decode_command, ServerEvent};
use parlor_transport::{
    Accepted, ConnectionSender, WebSocketConnection, WebSocketTransport,
};

use crate::{Analytics, Dispatcher, ServerError};

/// Server configuration, normally read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. `0.0.0.0:3000`.
    pub addr: String,
    /// Allowed `Origin` header; `*` accepts any.
    pub cors_origin: String,
    /// Analytics ingest URL. Absent disables analytics entirely.
    pub analytics_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3000".to_string(),
            cors_origin: "*".to_string(),
            analytics_endpoint: None,
        }
    }
}

impl ServerConfig {
    /// Reads `PORT`, `CORS_ORIGIN`, and `ANALYTICS_ENDPOINT`.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Self {
            addr: format!("0.0.0.0:{port}"),
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "*".to_string()),
            analytics_endpoint: std::env::var("ANALYTICS_ENDPOINT").ok(),
        }
    }
}

/// A bound game server. Call [`run`](Self::run) to accept connections.
pub struct GameServer {
    transport: WebSocketTransport,
    dispatcher: Dispatcher,
}

impl GameServer {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let transport = WebSocketTransport::bind(&config.addr)
            .await?
            .with_allowed_origin(&config.cors_origin);
        let dispatcher =
            Dispatcher::new(Analytics::new(config.analytics_endpoint));
        Ok(Self {
            transport,
            dispatcher,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the dispatcher (shared with all connections).
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(Accepted::Socket(conn)) => {
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(handle_connection(conn, dispatcher));
                }
                Ok(Accepted::Health(probe)) => {
                    let (rooms, connections) =
                        self.dispatcher.health_snapshot().await;
                    let body = serde_json::json!({
                        "status": "ok",
                        "rooms": rooms,
                        "connections": connections,
                    });
                    tokio::spawn(async move {
                        probe.respond(&body.to_string()).await;
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Reads one connection until it closes, feeding the dispatcher.
async fn handle_connection(conn: WebSocketConnection, dispatcher: Dispatcher) {
    let (sender, mut receiver) = conn.split();
    dispatcher.handle_connect(sender.id()).await;

    loop {
        match receiver.recv().await {
            Ok(Some(text)) => match decode_command(&text) {
                Ok(cmd) => dispatcher.handle_command(&sender, cmd).await,
                Err(e) => {
                    tracing::debug!(
                        conn_id = %sender.id(),
                        error = %e,
                        "undecodable command"
                    );
                    send_malformed(&sender);
                }
            },
            Ok(None) => {
                tracing::debug!(conn_id = %sender.id(), "closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(
                    conn_id = %sender.id(), error = %e, "recv error"
                );
                break;
            }
        }
    }

    dispatcher.handle_disconnect(sender.id()).await;
}

fn send_malformed(sender: &ConnectionSender) {
    let event = ServerEvent::Error {
        message: "Malformed command".to_string(),
    };
    if let Ok(text) = parlor_protocol::encode_event(&event) {
        sender.send(text);
    }
}
