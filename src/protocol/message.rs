//! Inbound and outbound frame payloads.
//!
//! Inbound frames are decoded best-effort: structured JSON first, the raw
//! frame otherwise. Nothing is ever dropped for failing to decode; the shape
//! of the payload is the subscriber's concern.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as Frame;

use crate::error::Result;

use super::notification::Notification;

// ============================================================================
// Constants
// ============================================================================

/// Optional greeting sent right after a successful open.
pub const HELLO_FRAME: &str = r#"{"type":"hello"}"#;

// ============================================================================
// InboundMessage
// ============================================================================

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Frame decoded as JSON.
    Json(Value),

    /// Text frame that is not valid JSON.
    Text(String),

    /// Binary frame that is not valid JSON.
    Binary(Vec<u8>),
}

impl InboundMessage {
    /// Decodes a text frame.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    /// Decodes a binary frame.
    #[must_use]
    pub fn from_binary(bytes: &[u8]) -> Self {
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Binary(bytes.to_vec()),
        }
    }

    /// Decodes a transport frame.
    ///
    /// Returns `None` for control frames (ping, pong, close).
    #[must_use]
    pub(crate) fn from_frame(frame: &Frame) -> Option<Self> {
        match frame {
            Frame::Text(text) => Some(Self::from_text(text.as_str())),
            Frame::Binary(bytes) => Some(Self::from_binary(bytes)),
            _ => None,
        }
    }

    /// Returns the JSON value, if the frame decoded.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if the frame decoded as JSON.
    #[inline]
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    /// Returns the `"type"` discriminator of a JSON object payload.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.as_json()?.get("type")?.as_str()
    }

    /// Interprets the payload as a warehouse notification.
    ///
    /// Returns `None` for non-JSON frames.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        self.as_json().map(Notification::from_value)
    }

    /// Deserializes the JSON payload into a caller-defined type.
    ///
    /// Returns `None` for non-JSON frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the shape does not match.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Option<Result<T>> {
        self.as_json()
            .map(|value| T::deserialize(value).map_err(Into::into))
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// Serializes an outbound payload into a text frame body.
///
/// # Errors
///
/// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
pub(crate) fn encode_outbound<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_text_json_decodes() {
        let message = InboundMessage::from_text(r#"{"type":"ack","received":{"n":1}}"#);
        assert_eq!(message, InboundMessage::Json(json!({"type": "ack", "received": {"n": 1}})));
        assert_eq!(message.kind(), Some("ack"));
    }

    #[test]
    fn test_text_fallback_keeps_raw() {
        let message = InboundMessage::from_text("pong!");
        assert_eq!(message, InboundMessage::Text("pong!".into()));
        assert!(!message.is_json());
        assert!(message.kind().is_none());
        assert!(message.notification().is_none());
    }

    #[test]
    fn test_json_scalar_decodes() {
        assert_eq!(InboundMessage::from_text("42"), InboundMessage::Json(json!(42)));
    }

    #[test]
    fn test_binary_json_and_fallback() {
        assert_eq!(
            InboundMessage::from_binary(br#"{"a":1}"#),
            InboundMessage::Json(json!({"a": 1}))
        );
        assert_eq!(
            InboundMessage::from_binary(&[0xff, 0x00]),
            InboundMessage::Binary(vec![0xff, 0x00])
        );
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert!(InboundMessage::from_frame(&Frame::Ping(Default::default())).is_none());
        assert!(InboundMessage::from_frame(&Frame::Pong(Default::default())).is_none());
        assert!(InboundMessage::from_frame(&Frame::Close(None)).is_none());
        assert!(InboundMessage::from_frame(&Frame::Text("x".to_string().into())).is_some());
    }

    #[test]
    fn test_deserialize_custom_type() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Ping {
            seq: u32,
        }

        let message = InboundMessage::from_text(r#"{"seq":7}"#);
        let ping: Ping = message.deserialize().expect("json").expect("shape");
        assert_eq!(ping, Ping { seq: 7 });

        let wrong = InboundMessage::from_text(r#"{"seq":"x"}"#);
        assert!(wrong.deserialize::<Ping>().expect("json").is_err());

        let raw = InboundMessage::from_text("nope");
        assert!(raw.deserialize::<Ping>().is_none());
    }

    #[test]
    fn test_encode_outbound() {
        let frame = encode_outbound(&json!({"action": "subscribe", "robot_id": "RB-001"})).unwrap();
        assert_eq!(frame, r#"{"action":"subscribe","robot_id":"RB-001"}"#);
    }

    #[test]
    fn test_hello_frame_is_json() {
        assert_eq!(InboundMessage::from_text(HELLO_FRAME).kind(), Some("hello"));
    }
}
