//! Message types for Tally's wire format.
//!
//! Every type here is a flat JSON object (or, for the room command, a
//! bare token). Field names follow what deployed clients already send and
//! read, which is why some of them are camelCase and some are not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `errno` value carried by terminal room messages (`ECONNRESET` on Linux).
pub const ECONNRESET: i32 = 104;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a room.
///
/// Assigned sequentially by the room registry and never reused, so a
/// stale id can only ever miss, never land in somebody else's room.
///
/// `#[serde(transparent)]` keeps it a plain number on the wire:
/// `RoomId(3)` is just `3` in JSON.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Hall endpoint
// ---------------------------------------------------------------------------

/// Client → Hall: "this is who I am, find me a partner."
///
/// `openid` is an opaque identifier supplied by the client and trusted
/// as-is; it is the uniqueness key for a player across the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    pub openid: String,
    #[serde(rename = "nickName")]
    pub nick_name: String,
}

/// Where a player stands in matchmaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HallStatus {
    /// Queued, or already placed and told to keep waiting.
    #[serde(rename = "matching")]
    Matching,
    /// Nobody arrived in time; paired with a synthetic opponent.
    #[serde(rename = "matched")]
    Matched,
    /// Paired with another human.
    #[serde(rename = "match success")]
    MatchSuccess,
}

/// Hall → Client status update.
///
/// `roomid` is `null` until the player has been placed in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallMessage {
    pub errno: i32,
    pub errmsg: String,
    pub msg: HallStatus,
    pub roomid: Option<RoomId>,
}

impl HallMessage {
    /// "Still looking."
    pub fn matching() -> Self {
        Self::ok(HallStatus::Matching, None)
    }

    /// "Your wait ran out; here is a room with a bot in it."
    pub fn matched(room_id: RoomId) -> Self {
        Self::ok(HallStatus::Matched, Some(room_id))
    }

    /// "You've been paired with another player in this room."
    pub fn match_success(room_id: RoomId) -> Self {
        Self::ok(HallStatus::MatchSuccess, Some(room_id))
    }

    fn ok(msg: HallStatus, roomid: Option<RoomId>) -> Self {
        Self {
            errno: 0,
            errmsg: String::new(),
            msg,
            roomid,
        }
    }
}

// ---------------------------------------------------------------------------
// Room endpoint
// ---------------------------------------------------------------------------

/// Room → Client update about the *other* side.
///
/// Sent as an initial resync when a connection binds to its seat, as an
/// incremental push whenever the other side adds, and once more as a
/// terminal message (non-zero `errno`) right before the server closes
/// the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub errno: i32,
    pub errmsg: String,
    pub another_nick_name: Option<String>,
    pub another_add: u32,
}

impl RoomMessage {
    /// The other side is called `nickname` and has counted `count`.
    pub fn update(nickname: impl Into<String>, count: u32) -> Self {
        Self {
            errno: 0,
            errmsg: String::new(),
            another_nick_name: Some(nickname.into()),
            another_add: count,
        }
    }

    /// Terminal: the other player disconnected.
    pub fn peer_left() -> Self {
        Self::terminal("peer left")
    }

    /// Terminal: the synthetic opponent is done.
    pub fn bot_left() -> Self {
        Self::terminal("bot left")
    }

    /// Returns `true` for the messages that precede a forced close.
    pub fn is_terminal(&self) -> bool {
        self.errno != 0
    }

    fn terminal(errmsg: &str) -> Self {
        Self {
            errno: ECONNRESET,
            errmsg: errmsg.to_owned(),
            another_nick_name: None,
            another_add: 0,
        }
    }
}

/// Client → Room command.
///
/// The room endpoint speaks bare tokens rather than JSON; the only one
/// defined is `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Increment my count.
    Add,
}

impl ClientCommand {
    /// Parses a text frame. Anything that isn't a known token is `None`
    /// and gets ignored by the room endpoint.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "add" => Some(Self::Add),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! The field names and status strings here are what deployed clients
    //! read, so these tests pin the JSON shape rather than round-trip it.

    use super::*;

    #[test]
    fn test_room_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&RoomId(99)).unwrap();
        assert_eq!(json, "99");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_identify_reads_nick_name_field() {
        let id: Identify =
            serde_json::from_str(r#"{"openid":"b1","nickName":"Bob"}"#)
                .unwrap();
        assert_eq!(
            id,
            Identify {
                openid: "b1".into(),
                nick_name: "Bob".into(),
            }
        );
    }

    #[test]
    fn test_identify_missing_openid_is_rejected() {
        let result: Result<Identify, _> =
            serde_json::from_str(r#"{"nickName":"Bob"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_hall_matching_has_null_roomid() {
        let json = serde_json::to_value(HallMessage::matching()).unwrap();
        assert_eq!(json["errno"], 0);
        assert_eq!(json["errmsg"], "");
        assert_eq!(json["msg"], "matching");
        assert!(json["roomid"].is_null());
    }

    #[test]
    fn test_hall_status_strings() {
        let matched = serde_json::to_value(HallMessage::matched(RoomId(2)))
            .unwrap();
        assert_eq!(matched["msg"], "matched");
        assert_eq!(matched["roomid"], 2);

        let success =
            serde_json::to_value(HallMessage::match_success(RoomId(5)))
                .unwrap();
        assert_eq!(success["msg"], "match success");
        assert_eq!(success["roomid"], 5);
    }

    #[test]
    fn test_room_update_uses_camel_case_fields() {
        let json = serde_json::to_value(RoomMessage::update("Bot", 7)).unwrap();
        assert_eq!(json["errno"], 0);
        assert_eq!(json["anotherNickName"], "Bot");
        assert_eq!(json["anotherAdd"], 7);
    }

    #[test]
    fn test_room_terminal_messages() {
        let peer = RoomMessage::peer_left();
        assert!(peer.is_terminal());
        assert_eq!(peer.errno, ECONNRESET);
        assert_eq!(peer.errmsg, "peer left");

        let json = serde_json::to_value(RoomMessage::bot_left()).unwrap();
        assert_eq!(json["errno"], 104);
        assert_eq!(json["errmsg"], "bot left");
        assert!(json["anotherNickName"].is_null());
        assert_eq!(json["anotherAdd"], 0);
    }

    #[test]
    fn test_update_is_not_terminal() {
        assert!(!RoomMessage::update("Alice", 0).is_terminal());
    }

    #[test]
    fn test_client_command_parse() {
        assert_eq!(ClientCommand::parse("add"), Some(ClientCommand::Add));
        assert_eq!(ClientCommand::parse("ADD"), None);
        assert_eq!(ClientCommand::parse(" add"), None);
        assert_eq!(ClientCommand::parse(""), None);
    }
}
