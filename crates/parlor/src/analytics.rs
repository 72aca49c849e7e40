//! Fire-and-forget analytics sink.
//!
//! Events go through a bounded channel into a detached task that POSTs
//! them to the configured endpoint. `emit` never blocks and never fails:
//! a full queue or a dead sink just drops the event. With no endpoint
//! configured the whole thing is a no-op.

use serde::Serialize;
use tokio::sync::mpsc;

const QUEUE_SIZE: usize = 256;

/// One analytics datum. Shaped for a generic JSON ingest endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub kind: &'static str,
    pub room_id: String,
    pub game_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(
        kind: &'static str,
        room_id: &str,
        game_type: &str,
        player: Option<&str>,
    ) -> Self {
        Self {
            kind,
            room_id: room_id.to_string(),
            game_type: game_type.to_string(),
            player: player.map(str::to_string),
        }
    }
}

/// Handle to the sink. Cheap to clone; all clones feed one queue.
#[derive(Clone)]
pub struct Analytics {
    tx: Option<mpsc::Sender<AnalyticsEvent>>,
}

impl Analytics {
    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Starts the forwarding task if an endpoint is configured.
    /// Must be called from within a Tokio runtime.
    pub fn new(endpoint: Option<String>) -> Self {
        let Some(endpoint) = endpoint else {
            return Self::disabled();
        };
        let (tx, mut rx) = mpsc::channel::<AnalyticsEvent>(QUEUE_SIZE);
        tokio::spawn(async move {
            let client = reqwest::Client::new();
            while let Some(event) = rx.recv().await {
                // Delivery is best-effort; failures are invisible.
                let _ = client.post(&endpoint).json(&event).send().await;
            }
        });
        tracing::info!("analytics sink enabled");
        Self { tx: Some(tx) }
    }

    /// Queues an event. Drops it silently when the queue is full or the
    /// sink is disabled.
    pub fn emit(&self, event: AnalyticsEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(event);
        }
    }
}
