//! Error types for the room layer.

/// Errors that can occur during room operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (or was deleted after its grace window).
    #[error("Room not found")]
    NotFound(String),
}
