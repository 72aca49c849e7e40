//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The game wire and the health endpoint share one port. `accept` peeks at
//! the request line before upgrading: `GET /health` is answered as plain
//! HTTP, everything else goes through the WebSocket handshake.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::Message;

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// A WebSocket [`WebSocketTransport`] listening for game clients and
/// health probes on one port.
pub struct WebSocketTransport {
    listener: TcpListener,
    /// Allowed `Origin` header. `None` or `"*"` accepts any origin.
    allowed_origin: Option<String>,
}

/// What `accept` produced: a real game connection or a health probe.
pub enum Accepted {
    Socket(WebSocketConnection),
    Health(HealthProbe),
}

impl WebSocketTransport {
    /// Binds a new transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            allowed_origin: None,
        })
    }

    /// Restricts the `Origin` header accepted during the upgrade.
    /// `"*"` (or never calling this) accepts everything.
    pub fn with_allowed_origin(mut self, origin: &str) -> Self {
        if origin != "*" {
            self.allowed_origin = Some(origin.to_string());
        }
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and sorts the next incoming stream.
    pub async fn accept(&mut self) -> Result<Accepted, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut probe = [0u8; 16];
        let n = stream
            .peek(&mut probe)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if probe[..n].starts_with(b"GET /health") {
            return Ok(Accepted::Health(HealthProbe { stream }));
        }

        // Headers captured during the upgrade callback: the effective
        // client IP (forwarded-for aware) is needed for rate limiting.
        let captured: Arc<Mutex<Option<IpAddr>>> = Arc::new(Mutex::new(None));
        let captured_in = Arc::clone(&captured);
        let allowed = self.allowed_origin.clone();

        let callback = move |req: &Request, resp: Response| {
            if let Some(allowed) = &allowed {
                let origin = req
                    .headers()
                    .get("origin")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                if origin != allowed {
                    let reject: ErrorResponse = Response::builder()
                        .status(403)
                        .body(Some("origin not allowed".to_string()))
                        .expect("static response");
                    return Err(reject);
                }
            }
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok());
            *captured_in.lock().expect("header capture") = forwarded;
            Ok(resp)
        };

        let ws = tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))?;

        let ip = captured
            .lock()
            .expect("header capture")
            .unwrap_or_else(|| addr.ip());
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, %ip, "accepted WebSocket connection");

        Ok(Accepted::Socket(WebSocketConnection { id, ip, ws }))
    }
}

/// A pending `GET /health` request. Answer it with [`respond`](Self::respond).
pub struct HealthProbe {
    stream: TcpStream,
}

impl HealthProbe {
    /// Writes a one-shot `200 OK` JSON response and closes the stream.
    pub async fn respond(mut self, body: &str) {
        // Drain the request bytes so the close is clean.
        let mut buf = [0u8; 1024];
        let _ = self.stream.read(&mut buf).await;

        let response = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/json\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = self.stream.write_all(response.as_bytes()).await;
        let _ = self.stream.shutdown().await;
    }
}

/// A single accepted WebSocket connection, not yet split.
pub struct WebSocketConnection {
    id: ConnectionId,
    ip: IpAddr,
    ws: WsStream,
}

impl WebSocketConnection {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The effective client IP (forwarded-for header wins over the peer).
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Splits into a cheap-clone sender handle and the inbound receiver.
    ///
    /// Spawns the writer task that drains the outbound queue into the
    /// socket, so `ConnectionSender::send` never suspends the caller.
    pub fn split(self) -> (ConnectionSender, ConnectionReceiver) {
        let (sink, stream) = self.ws.split();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(self.id, sink, rx));
        (
            ConnectionSender {
                id: self.id,
                ip: self.ip,
                tx,
            },
            ConnectionReceiver {
                id: self.id,
                stream,
            },
        )
    }
}

async fn write_loop(
    id: ConnectionId,
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(text) = rx.recv().await {
        if sink.send(Message::Text(text.into())).await.is_err() {
            tracing::debug!(%id, "write loop ended: peer gone");
            break;
        }
    }
    let _ = sink.close().await;
}

/// Outbound handle to one connection. This is the "connection handle"
/// stored in room seats; cloning is cheap and sends never block.
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    id: ConnectionId,
    ip: IpAddr,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionSender {
    /// Builds a sender with no socket behind it, returning the queue's
    /// receiving end. Useful for in-process clients and tests.
    pub fn detached(
        id: ConnectionId,
        ip: IpAddr,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, ip, tx }, rx)
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The effective client IP.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Queues a text frame. Silently drops if the writer task is gone
    /// (the peer disconnected).
    pub fn send(&self, text: String) {
        let _ = self.tx.send(text);
    }
}

impl PartialEq for ConnectionSender {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionSender {}

/// Inbound half of a connection.
pub struct ConnectionReceiver {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
}

impl ConnectionReceiver {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Receives the next text message.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    pub async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.into()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/frame
                Some(Err(e)) => {
                    return Err(TransportError::ConnectionClosed(
                        e.to_string(),
                    ));
                }
            }
        }
    }
}
