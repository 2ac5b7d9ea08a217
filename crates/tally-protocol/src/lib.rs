//! Wire protocol for Tally.
//!
//! This crate defines what clients and the server say to each other on
//! the two endpoints:
//!
//! - **Types** ([`Identify`], [`HallMessage`], [`RoomMessage`],
//!   [`ClientCommand`], etc.): the flat message shapes on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to and from text frames.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw text) and the hall and
//! room layers. It doesn't know about queues or rooms, only shapes.
//!
//! ```text
//! Transport (text) → Protocol (typed messages) → Hall / Room
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, HallMessage, HallStatus, Identify, RoomId, RoomMessage,
    ECONNRESET,
};
