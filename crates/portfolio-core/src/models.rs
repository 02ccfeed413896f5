//! Core data models for the portfolio API.
//!
//! Two entities are persisted: [`ContactMessage`] (contact form submissions
//! with a small status lifecycle) and [`StatusCheck`] (client pings). Each
//! is built through an explicit constructor that takes its validated input
//! plus the server-assigned fields, never from a merged payload.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::Record;
use crate::validation::{ValidatedContact, ValidatedStatusCheck};

/// Lifecycle state of a [`ContactMessage`].
///
/// Every state can move to every other state; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Archived,
}

impl MessageStatus {
    pub const ALL: [MessageStatus; 3] = [Self::Unread, Self::Read, Self::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the [`MessageStatus`] values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid status '{0}', expected one of: unread, read, archived")]
pub struct ParseMessageStatusError(pub String);

impl FromStr for MessageStatus {
    type Err = ParseMessageStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseMessageStatusError(s.to_string()))
    }
}

/// A persisted contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

impl ContactMessage {
    /// Build a message from validated input and server-assigned fields.
    ///
    /// The input fields are copied verbatim. `timestamp` is truncated to
    /// microseconds, the precision records are persisted with.
    pub fn from_submission(
        input: ValidatedContact,
        id: Uuid,
        timestamp: DateTime<Utc>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: input.name,
            email: input.email,
            subject: input.subject,
            message: input.message,
            timestamp: timestamp.trunc_subsecs(6),
            status,
        }
    }
}

impl Record for ContactMessage {
    const COLLECTION: &'static str = "contact_messages";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A persisted client status ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(input: ValidatedStatusCheck, id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            client_name: input.client_name,
            timestamp: timestamp.trunc_subsecs(6),
        }
    }
}

impl Record for StatusCheck {
    const COLLECTION: &'static str = "status_checks";

    fn id(&self) -> &str {
        &self.id
    }
}

/// RFC 3339 UTC timestamps with fixed microsecond precision.
///
/// The fixed width keeps lexicographic order equal to chronological order,
/// which is what document stores sort stored strings by.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn validated() -> ValidatedContact {
        ValidatedContact {
            name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            subject: "Testing".to_string(),
            message: "hello".to_string(),
        }
    }

    #[test]
    fn test_status_parse_accepts_only_enumeration() {
        assert_eq!("unread".parse::<MessageStatus>(), Ok(MessageStatus::Unread));
        assert_eq!("read".parse::<MessageStatus>(), Ok(MessageStatus::Read));
        assert_eq!("archived".parse::<MessageStatus>(), Ok(MessageStatus::Archived));
        assert!("READ".parse::<MessageStatus>().is_err());
        assert!("deleted".parse::<MessageStatus>().is_err());
        assert!("".parse::<MessageStatus>().is_err());
    }

    #[test]
    fn test_status_defaults_to_unread() {
        assert_eq!(MessageStatus::default(), MessageStatus::Unread);
    }

    #[test]
    fn test_from_submission_copies_input_and_assigns_fields() {
        let id = Uuid::new_v4();
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = ContactMessage::from_submission(validated(), id, ts, MessageStatus::Unread);
        assert_eq!(msg.id, id.to_string());
        assert_eq!(msg.name, "John Doe");
        assert_eq!(msg.email, "john.doe@example.com");
        assert_eq!(msg.timestamp, ts);
        assert_eq!(msg.status, MessageStatus::Unread);
    }

    #[test]
    fn test_serialized_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg =
            ContactMessage::from_submission(validated(), Uuid::nil(), ts, MessageStatus::Read);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["timestamp"], "2024-05-01T12:00:00.000000Z");
        assert_eq!(value["status"], "read");

        let back: ContactMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_timestamp_truncated_to_micros() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let msg =
            ContactMessage::from_submission(validated(), Uuid::new_v4(), ts, MessageStatus::Unread);
        assert_eq!(msg.timestamp.timestamp_subsec_nanos(), 123_456_000);
    }
}
