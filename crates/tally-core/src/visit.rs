use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{
    enrich::{classify_device, extract_language, UNKNOWN},
    error::ValidationError,
};

/// Event tag used when the client does not send one.
pub const DEFAULT_EVENT_TYPE: &str = "page_view";

/// Event tag for visits recorded through the iOS beacon.
pub const IOS_EVENT_TYPE: &str = "ios_visit";

/// Candidate fields of a tracking request, before validation.
///
/// Every field is optional and loosely typed: string fields accept numbers,
/// integer fields accept numeric strings. Unknown keys (including any
/// client-supplied `ip_address`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub visitor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub referrer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub screen_width: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub screen_height: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub duration: Option<i64>,
}

impl TrackPayload {
    /// Interpret an arbitrary JSON value as a payload. Only objects qualify.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Build a payload from raw query-string pairs.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let object: Map<String, Value> = params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        serde_json::from_value(Value::Object(object)).unwrap_or_default()
    }
}

/// Request-derived inputs that never come from the client payload.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    /// Resolved from proxy headers or the transport peer; may be empty.
    pub ip_address: String,
    /// Raw `User-Agent` header, used when the payload has no `user_agent`.
    pub user_agent: Option<String>,
    /// Raw `Accept-Language` header.
    pub accept_language: Option<String>,
}

/// Coarse location resolved from an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
        }
    }
}

impl Default for GeoLocation {
    fn default() -> Self {
        Self::unknown()
    }
}

/// A fully populated visit, ready for insertion. Mirrors the `visits` table
/// minus the store-assigned `id`, `created_at` and `processed` columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVisit {
    pub visitor_id: String,
    pub timestamp: String,
    pub url: String,
    pub path: String,
    pub referrer: String,
    pub user_agent: String,
    pub screen_width: i64,
    pub screen_height: i64,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub language: String,
    pub event_type: String,
    pub duration: i64,
}

impl NewVisit {
    /// Validate `payload`, apply defaults and merge in server-side enrichment.
    ///
    /// `visitor_id` and `timestamp` must be present and non-blank.
    pub fn build(
        payload: TrackPayload,
        ctx: &VisitContext,
        geo: GeoLocation,
    ) -> Result<Self, ValidationError> {
        let visitor_id =
            non_blank(payload.visitor_id).ok_or(ValidationError::MissingField("visitor_id"))?;
        let timestamp =
            non_blank(payload.timestamp).ok_or(ValidationError::MissingField("timestamp"))?;

        let user_agent = non_blank(payload.user_agent)
            .or_else(|| ctx.user_agent.clone())
            .unwrap_or_default();

        Ok(Self {
            device_type: classify_device(&user_agent).to_string(),
            language: extract_language(ctx.accept_language.as_deref()),
            visitor_id,
            timestamp,
            url: payload.url.unwrap_or_default(),
            path: payload.path.unwrap_or_default(),
            referrer: payload.referrer.unwrap_or_default(),
            user_agent,
            screen_width: payload.screen_width.unwrap_or(0),
            screen_height: payload.screen_height.unwrap_or(0),
            ip_address: ctx.ip_address.clone(),
            country: geo.country,
            city: geo.city,
            event_type: non_blank(payload.event_type)
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            duration: payload.duration.unwrap_or(0),
        })
    }
}

/// One persisted row of the `visits` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub visitor_id: String,
    pub timestamp: String,
    pub url: String,
    pub path: String,
    pub referrer: String,
    pub user_agent: String,
    pub screen_width: i64,
    pub screen_height: i64,
    pub ip_address: String,
    pub country: String,
    pub city: String,
    pub device_type: String,
    pub language: String,
    pub event_type: String,
    pub duration: i64,
    pub created_at: String,
    /// Reserved; always 0.
    pub processed: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ctx() -> VisitContext {
        VisitContext {
            ip_address: "203.0.113.7".to_string(),
            user_agent: Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".to_string()),
            accept_language: Some("fr-FR,fr;q=0.9".to_string()),
        }
    }

    #[test]
    fn build_applies_defaults() {
        let payload = TrackPayload::from_value(json!({
            "visitor_id": "v1",
            "timestamp": "2024-01-01T00:00:00Z",
            "user_agent": "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"
        }))
        .expect("object payload");

        let visit = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).expect("valid");
        assert_eq!(visit.device_type, "Mobile");
        assert_eq!(visit.event_type, "page_view");
        assert_eq!(visit.duration, 0);
        assert_eq!(visit.screen_width, 0);
        assert_eq!(visit.url, "");
        assert_eq!(visit.language, "fr-FR");
        assert_eq!(visit.country, "Unknown");
        assert_eq!(visit.ip_address, "203.0.113.7");
    }

    #[test]
    fn build_rejects_missing_visitor_id() {
        let payload = TrackPayload {
            timestamp: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let err = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("visitor_id"));
        assert_eq!(err.field(), "visitor_id");
    }

    #[test]
    fn build_rejects_blank_timestamp() {
        let payload = TrackPayload {
            visitor_id: Some("v1".to_string()),
            timestamp: Some("   ".to_string()),
            ..Default::default()
        };
        let err = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("timestamp"));
    }

    #[test]
    fn payload_user_agent_wins_over_header() {
        let payload = TrackPayload {
            visitor_id: Some("v1".to_string()),
            timestamp: Some("t".to_string()),
            user_agent: Some("Mozilla/5.0 (X11; CrOS x86_64 14541.0.0)".to_string()),
            ..Default::default()
        };
        let visit = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).expect("valid");
        assert_eq!(visit.device_type, "Laptop");

        let payload = TrackPayload {
            visitor_id: Some("v1".to_string()),
            timestamp: Some("t".to_string()),
            ..Default::default()
        };
        let visit = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).expect("valid");
        assert_eq!(visit.device_type, "Desktop");
    }

    #[test]
    fn client_ip_address_is_ignored() {
        let payload = TrackPayload::from_value(json!({
            "visitor_id": "v1",
            "timestamp": "t",
            "ip_address": "8.8.8.8"
        }))
        .expect("object payload");
        let visit = NewVisit::build(payload, &ctx(), GeoLocation::unknown()).expect("valid");
        assert_eq!(visit.ip_address, "203.0.113.7");
    }

    #[test]
    fn loose_types_are_coerced() {
        let payload = TrackPayload::from_value(json!({
            "visitor_id": 42,
            "timestamp": "t",
            "screen_width": "1920",
            "screen_height": 1080.0,
            "duration": "not-a-number",
            "referrer": null
        }))
        .expect("object payload");
        assert_eq!(payload.visitor_id.as_deref(), Some("42"));
        assert_eq!(payload.screen_width, Some(1920));
        assert_eq!(payload.screen_height, Some(1080));
        assert_eq!(payload.duration, None);
        assert_eq!(payload.referrer, None);
    }

    #[test]
    fn non_object_json_is_not_a_payload() {
        assert!(TrackPayload::from_value(json!([1, 2])).is_none());
        assert!(TrackPayload::from_value(json!("v1")).is_none());
    }

    #[test]
    fn from_query_reads_string_pairs() {
        let mut params = HashMap::new();
        params.insert("visitor_id".to_string(), "v9".to_string());
        params.insert("w".to_string(), "ignored".to_string());
        params.insert("duration".to_string(), "12".to_string());
        let payload = TrackPayload::from_query(&params);
        assert_eq!(payload.visitor_id.as_deref(), Some("v9"));
        assert_eq!(payload.duration, Some(12));
        assert_eq!(payload.timestamp, None);
    }

    #[test]
    fn blank_event_type_falls_back_to_default() {
        let payload = TrackPayload {
            visitor_id: Some("v1".to_string()),
            timestamp: Some("t".to_string()),
            event_type: Some(String::new()),
            ..Default::default()
        };
        let visit = NewVisit::build(payload, &VisitContext::default(), GeoLocation::unknown())
            .expect("valid");
        assert_eq!(visit.event_type, DEFAULT_EVENT_TYPE);
        assert_eq!(visit.language, "Unknown");
        assert_eq!(visit.device_type, "Unknown");
    }
}
