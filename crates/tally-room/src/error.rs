//! Error types for the room layer.

use tally_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist, or has already been torn down and
    /// removed from the registry.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The identity doesn't own either seat in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(String, RoomId),

    /// The room actor has stopped because the room was closed. Sending
    /// to a live room waits for channel space and never fails.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
