//! Error types for the protocol layer.
//!
//! Each crate in Tally defines its own error enum. When you see a
//! `ProtocolError`, the problem is in serialization or in the shape of a
//! message, not in networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into text).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning text into a Rust type).
    ///
    /// Common causes: malformed JSON, a missing `openid` or `nickName`,
    /// or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
