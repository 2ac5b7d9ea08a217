//! Unified error type for the Tally server.

use tally_protocol::ProtocolError;
use tally_room::RoomError;
use tally_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically inside the handlers.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown room, stopped room).
    #[error(transparent)]
    Room(#[from] RoomError),
}
