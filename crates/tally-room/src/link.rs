//! What a seat is connected to.
//!
//! Rooms and the hall never touch sockets. Each connection handler owns
//! its socket and hands out an [`Outbox`]; everything addressed to that
//! connection (messages, or a request to close) goes through it.

use tally_protocol::RoomMessage;
use tally_transport::ConnectionId;
use tokio::sync::mpsc;

/// An instruction for a connection handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound<M> {
    /// Encode and send this message.
    Message(M),
    /// Close the connection and stop.
    Close,
}

/// Channel sender for delivering [`Outbound`] items to a connection.
///
/// Unbounded so that sending never suspends while a room or the hall is
/// mid-update.
pub type Outbox<M> = mpsc::UnboundedSender<Outbound<M>>;

/// The connection side of a seat.
#[derive(Debug)]
pub enum PeerLink {
    /// Nobody has bound to this seat (yet, or any more).
    Vacant,
    /// A real client connection.
    Live {
        conn: ConnectionId,
        outbox: Outbox<RoomMessage>,
    },
    /// The synthetic opponent. Every send and close is a no-op.
    Null,
}

impl PeerLink {
    /// Returns `true` only for a real, bound connection.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }

    /// The bound connection, if any.
    pub fn conn(&self) -> Option<ConnectionId> {
        match self {
            Self::Live { conn, .. } => Some(*conn),
            Self::Vacant | Self::Null => None,
        }
    }

    /// Pushes a message to the connection.
    ///
    /// Returns `true` if it was handed to a live connection handler. A
    /// vacant seat, the null sink, or a handler that already went away
    /// all count as "skipped", never as errors.
    pub fn send(&self, msg: RoomMessage) -> bool {
        match self {
            Self::Live { outbox, .. } => {
                outbox.send(Outbound::Message(msg)).is_ok()
            }
            Self::Vacant | Self::Null => false,
        }
    }

    /// Asks the connection handler to close its socket.
    pub fn close(&self) {
        if let Self::Live { conn, outbox } = self {
            if outbox.send(Outbound::Close).is_err() {
                tracing::debug!(conn_id = %conn, "connection gone before close");
            }
        }
    }
}
