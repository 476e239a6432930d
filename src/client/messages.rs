//! Request and response bodies of the store's HTTP surface.
//!
//! Responses only model the fields the probe inspects. Every field is
//! optional so that an absent field surfaces as a checked condition in the
//! probe cycle instead of a decode failure. Bodies go through
//! [`decode_object`], so anything other than a JSON object is a decode failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode a response body that must be a JSON object.
///
/// Derived struct deserializers also accept arrays and match their elements
/// to fields by position, so the body is parsed as a map first.
pub fn decode_object<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let object: Map<String, Value> = serde_json::from_str(raw)?;
    serde_json::from_value(Value::Object(object))
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub user: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UseDatabaseResponse {
    #[serde(default)]
    pub token: Option<String>,
}

impl UseDatabaseResponse {
    /// Database token, if the store returned a non-empty one
    pub fn database_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetRequest {
    #[serde(rename = "KVs")]
    pub kvs: Vec<KeyValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedSetRequest {
    #[serde(rename = "setRequest")]
    pub set_request: SetRequest,
}

impl VerifiedSetRequest {
    pub fn single(kv: KeyValue) -> Self {
        Self {
            set_request: SetRequest { kvs: vec![kv] },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyRequest {
    pub key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedGetRequest {
    #[serde(rename = "keyRequest")]
    pub key_request: KeyRequest,
}

impl VerifiedGetRequest {
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key_request: KeyRequest { key: key.into() },
        }
    }
}

/// Transaction metadata returned by a verified write
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifiedSetResponse {
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
}

/// Entry returned by a verified read
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifiedGetResponse {
    #[serde(default, deserialize_with = "present")]
    pub tx: Option<Value>,
}

// A key that is present counts even when its value is `null`
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_request_wire_shape() {
        let request = VerifiedSetRequest::single(KeyValue {
            key: "ZGF0YTQy".to_string(),
            value: "ZGF0YTQy".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"setRequest": {"KVs": [{"key": "ZGF0YTQy", "value": "ZGF0YTQy"}]}})
        );
    }

    #[test]
    fn get_request_wire_shape() {
        let request = VerifiedGetRequest::for_key("ZGF0YTQy");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"keyRequest": {"key": "ZGF0YTQy"}})
        );
    }

    #[test]
    fn login_request_wire_shape() {
        let request = LoginRequest {
            user: "aW1tdWRi",
            password: "aW1tdWRi",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"user": "aW1tdWRi", "password": "aW1tdWRi"})
        );
    }

    #[test]
    fn missing_and_null_fields_are_distinguished() {
        let absent: VerifiedSetResponse = serde_json::from_str(r#"{"error": "boom"}"#).unwrap();
        assert!(absent.id.is_none());

        let null: VerifiedSetResponse = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(null.id, Some(Value::Null));

        let tx: VerifiedGetResponse = serde_json::from_str(r#"{"tx": "17"}"#).unwrap();
        assert_eq!(tx.tx, Some(json!("17")));
    }

    #[test]
    fn empty_database_token_is_treated_as_missing() {
        let empty: UseDatabaseResponse = serde_json::from_str(r#"{"token": ""}"#).unwrap();
        assert!(empty.database_token().is_none());

        let missing: UseDatabaseResponse = serde_json::from_str("{}").unwrap();
        assert!(missing.database_token().is_none());

        let present: UseDatabaseResponse = serde_json::from_str(r#"{"token": "db-tok"}"#).unwrap();
        assert_eq!(present.database_token(), Some("db-tok"));
    }

    #[test]
    fn non_object_body_fails_to_decode() {
        assert!(decode_object::<LoginResponse>("[]").is_err());
        assert!(decode_object::<LoginResponse>("").is_err());
        assert!(decode_object::<LoginResponse>("null").is_err());
        assert!(decode_object::<LoginResponse>(r#""token""#).is_err());
        assert!(decode_object::<LoginResponse>(r#"{"token": 7}"#).is_err());
    }

    #[test]
    fn array_bodies_are_not_matched_by_position() {
        assert!(decode_object::<UseDatabaseResponse>(r#"["t"]"#).is_err());
        assert!(decode_object::<VerifiedSetResponse>(r#"[{"error": "write rejected"}]"#).is_err());
        assert!(decode_object::<VerifiedGetResponse>("[1]").is_err());
    }

    #[test]
    fn object_bodies_keep_extra_fields_ignored() {
        let set: VerifiedSetResponse =
            decode_object(r#"{"id": "4", "nentries": 1, "extra": [1, 2]}"#).unwrap();
        assert_eq!(set.id, Some(json!("4")));

        let login: LoginResponse = decode_object(r#"{"warning": "no token"}"#).unwrap();
        assert!(login.token.is_none());
    }
}
