//! Typed warehouse notifications.
//!
//! The backend pushes JSON objects tagged by `"type"`:
//!
//! | `type` | Payload |
//! |--------|---------|
//! | `robot_update` | robot position, battery and next checkpoint |
//! | `inventory_alert` | zone, affected products, severity |
//! | `ack` | echo of a frame the client sent |
//! | `hello` | liveness greeting |
//!
//! Parsing never fails: payloads that do not match a known shape come back
//! as [`Notification::Unknown`].

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Payload Types
// ============================================================================

/// Robot location inside the warehouse. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Zone letter or name.
    #[serde(default)]
    pub zone: Option<String>,

    /// Row number.
    #[serde(default)]
    pub row: Option<i64>,

    /// Shelf number.
    #[serde(default)]
    pub shelf: Option<i64>,
}

/// Periodic robot telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotUpdate {
    /// Robot identifier, e.g. `RB-001`.
    pub robot_id: String,

    /// Battery level in percent.
    pub battery_level: f64,

    /// Robot status string.
    #[serde(default)]
    pub status: Option<String>,

    /// ISO-8601 timestamp of the reading.
    pub last_update: String,

    /// Current location.
    #[serde(default)]
    pub location: Location,

    /// Next checkpoint the robot heads to.
    #[serde(default)]
    pub next_checkpoint: Option<String>,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Stock is low.
    Low,
    /// Stock is critical.
    Critical,
}

/// Low or critical stock detected during a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAlert {
    /// Zone where the products were scanned.
    pub zone: String,

    /// Affected product identifiers.
    #[serde(default)]
    pub product_ids: Vec<String>,

    /// Alert severity.
    pub severity: Severity,

    /// ISO-8601 timestamp of the alert.
    pub at: String,
}

// ============================================================================
// Notification
// ============================================================================

/// A parsed notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// `robot_update`.
    RobotUpdate(RobotUpdate),

    /// `inventory_alert` (payload nested under `"payload"`).
    InventoryAlert(InventoryAlert),

    /// `ack` with the echoed frame.
    Ack {
        /// The frame the server received.
        received: Value,
    },

    /// `hello`.
    Hello,

    /// Anything else, including known types with an unexpected shape.
    Unknown {
        /// The `"type"` field, if present.
        kind: Option<String>,
        /// The full payload.
        raw: Value,
    },
}

impl Notification {
    /// Parses a JSON payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str);

        let parsed = match kind {
            Some("robot_update") => RobotUpdate::deserialize(value).ok().map(Self::RobotUpdate),

            Some("inventory_alert") => value
                .get("payload")
                .and_then(|payload| InventoryAlert::deserialize(payload).ok())
                .map(Self::InventoryAlert),

            Some("ack") => Some(Self::Ack {
                received: value.get("received").cloned().unwrap_or(Value::Null),
            }),

            Some("hello") => Some(Self::Hello),

            _ => None,
        };

        parsed.unwrap_or_else(|| Self::Unknown {
            kind: kind.map(str::to_string),
            raw: value.clone(),
        })
    }

    /// Returns the wire `"type"` for known variants.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::RobotUpdate(_) => Some("robot_update"),
            Self::InventoryAlert(_) => Some("inventory_alert"),
            Self::Ack { .. } => Some("ack"),
            Self::Hello => Some("hello"),
            Self::Unknown { kind, .. } => kind.as_deref(),
        }
    }

    /// Returns `true` if downstream views should refresh their data.
    ///
    /// Robot updates and inventory alerts change what the dashboard shows;
    /// acks and greetings do not.
    #[must_use]
    pub fn triggers_refresh(&self) -> bool {
        matches!(self, Self::RobotUpdate(_) | Self::InventoryAlert(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_parse_robot_update() {
        let value = json!({
            "type": "robot_update",
            "robot_id": "RB-001",
            "battery_level": 87.5,
            "status": "active",
            "last_update": "2025-01-01T10:00:00",
            "location": {"zone": "A", "row": 3, "shelf": 7},
            "next_checkpoint": "A-3-8"
        });

        let Notification::RobotUpdate(update) = Notification::from_value(&value) else {
            panic!("expected robot update");
        };

        assert_eq!(update.robot_id, "RB-001");
        assert_eq!(update.battery_level, 87.5);
        assert_eq!(update.location.zone.as_deref(), Some("A"));
        assert_eq!(update.location.row, Some(3));
        assert_eq!(update.next_checkpoint.as_deref(), Some("A-3-8"));
    }

    #[test]
    fn test_parse_robot_update_with_null_location_fields() {
        let value = json!({
            "type": "robot_update",
            "robot_id": "RB-002",
            "battery_level": 10,
            "last_update": "2025-01-01T10:00:00",
            "location": {"zone": null, "row": null, "shelf": null}
        });

        let parsed = Notification::from_value(&value);
        assert!(matches!(parsed, Notification::RobotUpdate(ref u) if u.location == Location::default()));
        assert!(parsed.triggers_refresh());
    }

    #[test]
    fn test_parse_inventory_alert() {
        let value = json!({
            "type": "inventory_alert",
            "payload": {
                "zone": "B",
                "product_ids": ["P-1", "P-2"],
                "severity": "CRITICAL",
                "at": "2025-01-01T10:00:00"
            }
        });

        let Notification::InventoryAlert(alert) = Notification::from_value(&value) else {
            panic!("expected inventory alert");
        };

        assert_eq!(alert.zone, "B");
        assert_eq!(alert.product_ids, vec!["P-1", "P-2"]);
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_parse_ack_and_hello() {
        let ack = Notification::from_value(&json!({"type": "ack", "received": {"action": "x"}}));
        assert_eq!(ack, Notification::Ack { received: json!({"action": "x"}) });
        assert!(!ack.triggers_refresh());

        assert_eq!(Notification::from_value(&json!({"type": "hello"})), Notification::Hello);
    }

    #[test]
    fn test_unknown_type() {
        let value = json!({"type": "shift_change", "zone": "C"});
        let parsed = Notification::from_value(&value);

        assert_eq!(parsed.kind(), Some("shift_change"));
        assert!(matches!(parsed, Notification::Unknown { raw, .. } if raw == value));
    }

    #[test]
    fn test_malformed_known_type_is_unknown() {
        let value = json!({"type": "inventory_alert", "payload": {"zone": 5}});
        let parsed = Notification::from_value(&value);

        assert!(matches!(parsed, Notification::Unknown { ref kind, .. } if kind.as_deref() == Some("inventory_alert")));
    }

    #[test]
    fn test_untagged_payload() {
        let parsed = Notification::from_value(&json!([1, 2, 3]));
        assert!(matches!(parsed, Notification::Unknown { kind: None, .. }));
        assert_eq!(parsed.kind(), None);
    }
}
