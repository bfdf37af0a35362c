//! Request and response bodies for `/enroll` and `/configuration`.
//!
//! Requests are decoded leniently: a body that is not a JSON object is an
//! empty request, and a field of the wrong type is treated as absent.

use biff_core::{AgentOptions, Schedule};
use serde::Serialize;
use serde_json::{Map, Value};

/// Decoded `/enroll` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollRequest {
    pub enroll_secret: Option<String>,
    pub platform_type: i64,
    pub host_identifier: String,
    pub host_details: Value,
}

impl EnrollRequest {
    pub fn from_body(body: &[u8]) -> Self {
        let fields = object_fields(body);
        Self {
            enroll_secret: string_field(&fields, "enroll_secret"),
            platform_type: fields.get("platform_type").map(platform_code).unwrap_or(0),
            host_identifier: string_field(&fields, "host_identifier").unwrap_or_default(),
            host_details: fields
                .get("host_details")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }
}

/// Decoded `/configuration` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationRequest {
    pub node_key: Option<String>,
}

impl ConfigurationRequest {
    pub fn from_body(body: &[u8]) -> Self {
        let fields = object_fields(body);
        Self {
            node_key: string_field(&fields, "node_key"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnrollResponse {
    pub node_key: Option<String>,
    pub node_invalid: bool,
}

impl EnrollResponse {
    pub fn accepted(node_key: String) -> Self {
        Self {
            node_key: Some(node_key),
            node_invalid: false,
        }
    }

    pub fn rejected() -> Self {
        Self {
            node_key: None,
            node_invalid: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigurationResponse {
    pub schedule: Schedule,
    #[serde(skip_serializing_if = "AgentOptions::is_empty")]
    pub options: AgentOptions,
    pub node_invalid: bool,
}

impl ConfigurationResponse {
    /// Tells the node to drop its key and enroll again.
    pub fn invalid_node() -> Self {
        Self {
            schedule: Schedule::new(),
            options: AgentOptions::new(),
            node_invalid: true,
        }
    }
}

fn object_fields(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Agents send the platform code as a string ("21"); accept numbers too,
/// truncating floats. Anything else maps to 0.
fn platform_code(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s),
        _ => 0,
    }
}

/// Parse the leading signed integer of `s`, ignoring trailing text.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().unwrap_or(0);
    if negative { -magnitude } else { magnitude }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enroll_request_full_body() {
        let body = json!({
            "enroll_secret": "somesecret",
            "platform_type": "21",
            "host_identifier": "H1",
            "host_details": {"os_version": {"platform": "darwin"}}
        });
        let req = EnrollRequest::from_body(body.to_string().as_bytes());

        assert_eq!(req.enroll_secret.as_deref(), Some("somesecret"));
        assert_eq!(req.platform_type, 21);
        assert_eq!(req.host_identifier, "H1");
        assert_eq!(req.host_details["os_version"]["platform"], "darwin");
    }

    #[test]
    fn enroll_request_float_platform_type() {
        let req = EnrollRequest::from_body(br#"{"platform_type": 21.0}"#);
        assert_eq!(req.platform_type, 21);
    }

    #[test]
    fn enroll_request_unparsable_body_is_empty() {
        let bodies: [&[u8]; 5] = [b"not json", b"", b"[1,2,3]", b"\"somesecret\"", b"{\"enroll_secret\":"];
        for body in bodies {
            let req = EnrollRequest::from_body(body);
            assert_eq!(req.enroll_secret, None);
            assert_eq!(req.platform_type, 0);
            assert_eq!(req.host_identifier, "");
            assert_eq!(req.host_details, json!({}));
        }
    }

    #[test]
    fn enroll_request_wrong_types_are_absent() {
        let body = json!({
            "enroll_secret": 12345,
            "platform_type": ["21"],
            "host_identifier": {"id": "H1"},
            "host_details": null
        });
        let req = EnrollRequest::from_body(body.to_string().as_bytes());

        assert_eq!(req.enroll_secret, None);
        assert_eq!(req.platform_type, 0);
        assert_eq!(req.host_identifier, "");
        assert_eq!(req.host_details, json!({}));
    }

    #[test]
    fn platform_type_conversion() {
        assert_eq!(platform_code(&json!(21)), 21);
        assert_eq!(platform_code(&json!("21")), 21);
        assert_eq!(platform_code(&json!(" 9")), 9);
        assert_eq!(platform_code(&json!("21abc")), 21);
        assert_eq!(platform_code(&json!("-3")), -3);
        assert_eq!(platform_code(&json!("darwin")), 0);
        assert_eq!(platform_code(&json!("")), 0);
        assert_eq!(platform_code(&json!(21.0)), 21);
        assert_eq!(platform_code(&json!(2.5)), 2);
        assert_eq!(platform_code(&json!(-7.9)), -7);
        assert_eq!(platform_code(&json!(true)), 0);
    }

    #[test]
    fn configuration_request_parsing() {
        let req = ConfigurationRequest::from_body(br#"{"node_key":"abc"}"#);
        assert_eq!(req.node_key.as_deref(), Some("abc"));

        assert_eq!(ConfigurationRequest::from_body(br#"{"node_key":null}"#).node_key, None);
        assert_eq!(ConfigurationRequest::from_body(br#"{"node_key":7}"#).node_key, None);
        assert_eq!(ConfigurationRequest::from_body(b"garbage").node_key, None);
    }

    #[test]
    fn rejected_enroll_response_shape() {
        let json = serde_json::to_value(EnrollResponse::rejected()).unwrap();
        assert_eq!(json, json!({"node_key": null, "node_invalid": true}));
    }

    #[test]
    fn invalid_node_response_shape() {
        let json = serde_json::to_value(ConfigurationResponse::invalid_node()).unwrap();
        assert_eq!(json, json!({"schedule": {}, "node_invalid": true}));
    }
}
