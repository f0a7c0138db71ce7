// core/src/ingest.rs
// Raw payload -> typed Sample, or a tagged rejection. Never panics.
use serde::Deserialize;
use serde_json::Value;
use serde_path_to_error as spte;

use crate::error::RejectReason;
use crate::models::Sample;

/// Wire shape: `{x, y, z, timestamp?, userID?}`. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct SampleIn {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default, rename = "userID", alias = "user_id", alias = "userId")]
    user_id: Option<Value>,
}

/// Metadata is opaque: strings stay as-is, anything else keeps its JSON text.
fn meta_text(v: Option<Value>) -> Option<String> {
    match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

/// Decode and validate one payload without touching any buffer.
pub fn decode_sample(raw: &[u8]) -> Result<Sample, RejectReason> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| RejectReason::MalformedPayload { reason: format!("invalid utf-8: {e}") })?;

    let value: Value = serde_json::from_str(text)
        .map_err(|e| RejectReason::MalformedPayload { reason: e.to_string() })?;

    if !value.is_object() {
        return Err(RejectReason::SchemaViolation {
            path: ".".into(),
            reason: "expected an object with numeric x, y, z".into(),
        });
    }

    let parsed: SampleIn = spte::deserialize(value).map_err(|e| RejectReason::SchemaViolation {
        path: e.path().to_string(),
        reason: e.inner().to_string(),
    })?;

    Ok(Sample::new(parsed.x, parsed.y, parsed.z).with_meta(meta_text(parsed.timestamp), meta_text(parsed.user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_record() {
        let s = decode_sample(br#"{"x":0.1,"y":-0.2,"z":9.8,"timestamp":"2024-05-01T10:00:00Z","userID":"u7"}"#)
            .unwrap();
        assert_eq!((s.x, s.y, s.z), (0.1, -0.2, 9.8));
        assert_eq!(s.timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(s.user_id.as_deref(), Some("u7"));
    }

    #[test]
    fn numeric_meta_is_kept_as_text() {
        let s = decode_sample(br#"{"x":1,"y":2,"z":3,"timestamp":1714557600,"user_id":42}"#).unwrap();
        assert_eq!(s.timestamp.as_deref(), Some("1714557600"));
        assert_eq!(s.user_id.as_deref(), Some("42"));
    }

    #[test]
    fn meta_is_optional() {
        let s = decode_sample(br#"{"x":1,"y":2,"z":3,"extra":true}"#).unwrap();
        assert_eq!(s, Sample::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn malformed_json() {
        let err = decode_sample(b"{x:1,").unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");
        let err = decode_sample(&[0xff, 0xfe]).unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");
    }

    #[test]
    fn missing_axis_is_schema_violation() {
        let err = decode_sample(br#"{"x":1,"y":2}"#).unwrap_err();
        assert!(matches!(err, RejectReason::SchemaViolation { .. }), "{err:?}");
    }

    #[test]
    fn non_numeric_axis_names_the_path() {
        match decode_sample(br#"{"x":1,"y":"two","z":3}"#).unwrap_err() {
            RejectReason::SchemaViolation { path, .. } => assert_eq!(path, "y"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_object_is_schema_violation() {
        assert_eq!(decode_sample(b"[1,2,3]").unwrap_err().kind(), "schema_violation");
        assert_eq!(decode_sample(b"42").unwrap_err().kind(), "schema_violation");
    }
}
