//! Player records and the two seats of a room.

use std::fmt;

use rand::Rng;

/// Which side of a room a player sits on.
///
/// The player who was waiting in the hall is always `First`; whoever
/// arrived to pair with them (or the synthetic opponent) is `Second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// The opposite seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Second => write!(f, "second"),
        }
    }
}

/// A player's identity and display name, plus the seat they hold.
///
/// `identity` is the caller-supplied `openid`. It is trusted as-is and
/// is the key that decides whether a player is already queued or seated.
///
/// Connections are deliberately not part of this record: rooms keep them
/// per seat, and a player binds a fresh one when they reach the room
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub identity: String,
    pub nickname: String,
    pub seat: Seat,
}

impl Player {
    pub fn new(
        identity: impl Into<String>,
        nickname: impl Into<String>,
        seat: Seat,
    ) -> Self {
        Self {
            identity: identity.into(),
            nickname: nickname.into(),
            seat,
        }
    }

    /// Fabricates the second-seat player of a synthetic room.
    ///
    /// The identity is `Bot` plus a random number so it can't collide
    /// with the fixed-format ids real clients send in practice.
    pub fn synthetic(nickname: &str) -> Self {
        let suffix: u32 = rand::rng().random_range(0..=1_000_000);
        Self::new(format!("Bot{suffix}"), nickname, Seat::Second)
    }

    /// A fresh record with the same identity and nickname in `seat`.
    pub fn reseated(&self, seat: Seat) -> Self {
        Self::new(self.identity.clone(), self.nickname.clone(), seat)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({}, {}, {})", self.identity, self.nickname, self.seat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_other_flips() {
        assert_eq!(Seat::First.other(), Seat::Second);
        assert_eq!(Seat::Second.other(), Seat::First);
    }

    #[test]
    fn test_reseated_keeps_identity_and_nickname() {
        let waiting = Player::new("a1", "Alice", Seat::First);
        let seated = waiting.reseated(Seat::Second);
        assert_eq!(seated.identity, "a1");
        assert_eq!(seated.nickname, "Alice");
        assert_eq!(seated.seat, Seat::Second);
    }

    #[test]
    fn test_synthetic_player_identity_shape() {
        let bot = Player::synthetic("Bot");
        assert_eq!(bot.nickname, "Bot");
        assert_eq!(bot.seat, Seat::Second);
        let suffix = bot.identity.strip_prefix("Bot").expect("Bot prefix");
        let n: u32 = suffix.parse().expect("numeric suffix");
        assert!(n <= 1_000_000);
    }

    #[test]
    fn test_player_display() {
        let p = Player::new("b1", "Bob", Seat::Second);
        assert_eq!(p.to_string(), "Player(b1, Bob, second)");
    }
}
