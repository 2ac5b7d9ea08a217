//! Rooms for Tally.
//!
//! A room pairs two seats, counts for each, and relays every increment
//! to the other side. Each room runs as an isolated Tokio task (actor
//! model); a synthetic room replaces the second player with a counter
//! the actor drives itself.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: allocates room IDs, creates and removes rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Player`] / [`Seat`]: who sits where
//! - [`PeerLink`] / [`Outbox`]: how a seat reaches its connection
//! - [`BotConfig`]: synthetic opponent settings

mod config;
mod error;
mod link;
mod pacer;
mod player;
mod registry;
mod room;

pub use config::BotConfig;
pub use error::RoomError;
pub use link::{Outbound, Outbox, PeerLink};
pub use player::{Player, Seat};
pub use registry::RoomRegistry;
pub use room::{RoomHandle, RoomInfo, RoomKind};
