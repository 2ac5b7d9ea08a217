//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and the text
//! frames that travel over a connection. The hall and room handlers don't
//! care HOW messages are serialized, they just hold something that
//! implements [`Codec`].
//!
//! Currently we provide [`JsonCodec`], which is what existing clients
//! speak.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to text and decode text back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between the per-connection tasks.
/// - `'static` → the codec owns everything it needs, so it can live in
///   the server state that every task holds an `Arc` to.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or
    /// doesn't match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use tally_protocol::{Codec, HallMessage, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
///
/// let text = codec.encode(&HallMessage::match_success(RoomId(4))).unwrap();
/// let decoded: HallMessage = codec.decode(&text).unwrap();
/// assert_eq!(decoded.roomid, Some(RoomId(4)));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Identify, RoomMessage};

    #[test]
    fn test_json_codec_decodes_identify() {
        let codec = JsonCodec;
        let id: Identify = codec
            .decode(r#"{"openid":"a1","nickName":"Alice"}"#)
            .expect("should decode");
        assert_eq!(id.openid, "a1");
        assert_eq!(id.nick_name, "Alice");
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let codec = JsonCodec;
        let result: Result<Identify, _> = codec.decode("not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encode_room_message_is_compact_json() {
        let codec = JsonCodec;
        let text = codec.encode(&RoomMessage::update("Bob", 2)).unwrap();
        assert_eq!(
            text,
            r#"{"errno":0,"errmsg":"","anotherNickName":"Bob","anotherAdd":2}"#
        );
    }
}
