//! Type-guarded access to event payloads.
//!
//! Payloads arrive as free-form JSON maps written by many app versions, so
//! every reducer reads them through these guards: a field only takes effect
//! when it is present and carries the expected type, otherwise the caller
//! falls back to the existing value. Malformed data is absorbed, never raised.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// The free-form JSON body carried by every event.
pub type Payload = serde_json::Map<String, Value>;

/// String field, borrowed.
pub fn get_str<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// String field, owned.
pub fn get_string(payload: &Payload, key: &str) -> Option<String> {
    get_str(payload, key).map(str::to_string)
}

/// Boolean field.
pub fn get_bool(payload: &Payload, key: &str) -> Option<bool> {
    payload.get(key).and_then(Value::as_bool)
}

/// Integer field.
pub fn get_i64(payload: &Payload, key: &str) -> Option<i64> {
    payload.get(key).and_then(Value::as_i64)
}

/// Float field. Accepts integer literals as well.
pub fn get_f64(payload: &Payload, key: &str) -> Option<f64> {
    payload.get(key).and_then(Value::as_f64)
}

/// Nested object field.
pub fn get_object<'a>(payload: &'a Payload, key: &str) -> Option<&'a Payload> {
    payload.get(key).and_then(Value::as_object)
}

/// Timestamp field: an RFC 3339 string, normalized to UTC.
pub fn get_timestamp(payload: &Payload, key: &str) -> Option<DateTime<Utc>> {
    get_str(payload, key).and_then(parse_timestamp)
}

/// List of strings. Entries of other types are dropped individually;
/// a non-array value fails the guard as a whole.
pub fn get_str_list(payload: &Payload, key: &str) -> Option<Vec<String>> {
    let items = payload.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// Parse an RFC 3339 timestamp, normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Render a timestamp the way app clients write them into payloads.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value
            .as_object()
            .expect("Should be a JSON object")
            .clone()
    }

    #[test]
    fn test_get_str_rejects_other_types() {
        let p = payload(json!({ "name": "Acme", "count": 3 }));

        assert_eq!(get_str(&p, "name"), Some("Acme"));
        assert_eq!(get_str(&p, "count"), None);
        assert_eq!(get_str(&p, "missing"), None);
    }

    #[test]
    fn test_get_timestamp_parses_rfc3339() {
        let p = payload(json!({
            "at": "2024-01-01T10:00:00.000Z",
            "bad": "yesterday",
            "num": 1704103200
        }));

        let at = get_timestamp(&p, "at").expect("Should parse timestamp");
        assert_eq!(at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(get_timestamp(&p, "bad"), None);
        assert_eq!(get_timestamp(&p, "num"), None);
    }

    #[test]
    fn test_get_str_list_drops_non_string_entries() {
        let p = payload(json!({ "aliases": ["Acme", 7, "Acme Corp", null] }));

        assert_eq!(
            get_str_list(&p, "aliases"),
            Some(vec!["Acme".to_string(), "Acme Corp".to_string()])
        );
    }

    #[test]
    fn test_get_str_list_rejects_non_array() {
        let p = payload(json!({ "aliases": "Acme" }));

        assert_eq!(get_str_list(&p, "aliases"), None);
    }

    #[test]
    fn test_timestamp_value_round_trips() {
        let at = parse_timestamp("2024-06-15T08:30:00Z").expect("Should parse timestamp");
        let value = timestamp_value(at);

        assert_eq!(value, json!("2024-06-15T08:30:00.000Z"));
        assert_eq!(
            parse_timestamp(value.as_str().expect("Should be a string")),
            Some(at)
        );
    }
}
