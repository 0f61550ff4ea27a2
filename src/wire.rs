//! Decoding of inbound push-channel frames.
//!
//! The channel is receive-only: the server sends `{"type": ..., "data": {...}}`
//! envelopes and the client never writes application frames back.

use serde::Deserialize;
use serde_json::Value;

use crate::models::AlertRecord;

pub const NEW_CRASH_TYPE: &str = "new_crash";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("envelope of type {0:?} carries no data object")]
    MissingData(String),

    #[error("unrecognized envelope type {0:?}")]
    UnknownType(String),
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Payload of a `new_crash` envelope as the backend broadcasts it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrashPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub video_filename: Option<String>,
    #[serde(default)]
    pub detection_timestamp: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    NewCrash(CrashPayload),
}

impl Envelope {
    pub fn into_alert(self) -> AlertRecord {
        match self {
            Envelope::NewCrash(payload) => {
                AlertRecord::new(payload.video_filename, payload.detection_timestamp)
            }
        }
    }
}

pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let envelope: RawEnvelope = serde_json::from_str(raw)?;
    if envelope.kind != NEW_CRASH_TYPE {
        return Err(DecodeError::UnknownType(envelope.kind));
    }
    match envelope.data {
        Some(data @ Value::Object(_)) => Ok(Envelope::NewCrash(serde_json::from_value(data)?)),
        _ => Err(DecodeError::MissingData(envelope.kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_new_crash() {
        let raw = r#"{"type":"new_crash","data":{"video_filename":"a.mp4","detection_timestamp":"2024-01-01T00:00:00Z"}}"#;
        let alert = decode(raw).unwrap().into_alert();
        assert_eq!(alert.video_filename, "a.mp4");
        assert_eq!(alert.detection_timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert!(!alert.is_synthetic);
    }

    #[test]
    fn test_decode_keeps_broadcast_extras() {
        let raw = r#"{"type":"new_crash","data":{"id":3,"video_filename":"b.mp4","detection_timestamp":"2024-01-01T00:00:00","created_at":"2024-01-01T00:00:01"}}"#;
        match decode(raw).unwrap() {
            Envelope::NewCrash(payload) => {
                assert_eq!(payload.id, Some(3));
                assert_eq!(payload.created_at.as_deref(), Some("2024-01-01T00:00:01"));
            }
        }
    }

    #[test]
    fn test_decode_empty_data_defaults_filename() {
        let alert = decode(r#"{"type":"new_crash","data":{}}"#).unwrap().into_alert();
        assert_eq!(alert.video_filename, "unknown");
        assert!(alert.detection_timestamp.is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!(
            decode(r#"{"type":"other"}"#),
            Err(DecodeError::UnknownType(t)) if t == "other"
        ));
    }

    #[test]
    fn test_missing_data_rejected() {
        assert!(matches!(
            decode(r#"{"type":"new_crash"}"#),
            Err(DecodeError::MissingData(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"new_crash","data":"a.mp4"}"#),
            Err(DecodeError::MissingData(_))
        ));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(decode("not json {{"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode(r#"{"data":{}}"#), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_wrongly_typed_payload_rejected() {
        let raw = r#"{"type":"new_crash","data":{"video_filename":42}}"#;
        assert!(matches!(decode(raw), Err(DecodeError::Malformed(_))));
    }
}
