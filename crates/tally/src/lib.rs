//! # Tally
//!
//! Realtime 1v1 matchmaking and relay server for a two-player counting
//! game.
//!
//! Clients connect to the hall, get paired with another player (or with
//! a synthetic opponent if nobody shows up in time), then reconnect to
//! their room and push `add` tokens that are relayed to the other side.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tally::prelude::*;
//!
//! # async fn start() -> Result<(), TallyError> {
//! let server = TallyServer::builder()
//!     .bind("0.0.0.0:1667")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TallyError;
pub use server::{
    DEFAULT_BIND_ADDR, HANDSHAKE_TIMEOUT, TallyServer, TallyServerBuilder,
};

/// Re-exports of the types most servers and tests need.
pub mod prelude {
    pub use crate::{DEFAULT_BIND_ADDR, TallyError, TallyServer, TallyServerBuilder};

    pub use tally_hall::{Admission, HallConfig, WaitingHall};
    pub use tally_protocol::{
        ClientCommand, Codec, HallMessage, HallStatus, Identify, JsonCodec,
        RoomId, RoomMessage, ECONNRESET,
    };
    pub use tally_room::{BotConfig, RoomInfo, RoomKind, RoomRegistry, Seat};
}
