//! The waiting hall for Tally.
//!
//! Players arrive here first. The hall keeps a queue of at most one
//! waiting player and either:
//!
//! 1. **Pairs** a new arrival with the waiting player, creating a room
//!    for two humans, or
//! 2. **Falls back** to a synthetic opponent once the waiting player has
//!    been alone for the wait window ([`HallConfig::match_wait`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← hands each hall connection's identify message here
//!     ↕
//! Hall (this crate)  ← queue, pairing, timeouts
//!     ↕
//! Room registry (below)  ← creates the rooms the hall decides on
//! ```

mod config;
mod hall;

pub use config::HallConfig;
pub use hall::{Admission, WaitingHall};
