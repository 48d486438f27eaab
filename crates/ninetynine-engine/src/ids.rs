//! Identity newtypes for players and rooms.
//!
//! Both ids are opaque strings. Wrapping them in newtypes means a
//! `RoomId` can never be passed where a `PlayerId` is expected, even
//! though both are strings underneath. `#[serde(transparent)]` keeps
//! the wire representation a plain JSON string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A server-issued player identifier, assigned once at join time and
/// never reused. 32 hex characters (128 bits of randomness).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Generates a fresh random player id.
    pub fn generate() -> Self {
        use rand::Rng;
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A room identifier. Human-friendly numeric-looking string ("4821"),
/// unique among live rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_generate_is_32_hex_chars() {
        let id = PlayerId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_player_id_generate_is_unique() {
        // 128 bits of entropy — a collision here means the generator
        // is broken, not unlucky.
        assert_ne!(PlayerId::generate(), PlayerId::generate());
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("4821")).unwrap();
        assert_eq!(json, "\"4821\"");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_string() {
        let id: PlayerId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id, PlayerId::from("abc123"));
    }
}
