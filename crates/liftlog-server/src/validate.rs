//! Request body fields and their canonical shapes.
//!
//! Each handler names the fields it needs; a missing field or one that does
//! not match its pattern rejects the whole request with the same response,
//! whatever the field. Fields without a pattern only have to be present.

use crate::respond::ApiError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

struct FieldPatterns {
    hex: Regex,
    email: Regex,
    username: Regex,
    login: Regex,
    date: Regex,
    digits: Regex,
    location: Regex,
}

static PATTERNS: LazyLock<FieldPatterns> = LazyLock::new(|| FieldPatterns {
    hex: Regex::new(r"^[a-f0-9]+$").expect("hex pattern"),
    email: Regex::new(r"^[\w.-]+@([\w-]+\.)+[\w-]{2,4}$").expect("email pattern"),
    username: Regex::new(r"^[a-zA-Z0-9._-]{5,}$").expect("username pattern"),
    login: Regex::new(r"^(([\w.-]+@([\w-]+\.)+[\w-]{2,4})|([a-zA-Z0-9._-]{5,}))$")
        .expect("login pattern"),
    date: Regex::new(r"^[0-9]{4}(-[0-9]{1,2}){1,2}$").expect("date pattern"),
    digits: Regex::new(r"^[0-9]+$").expect("digits pattern"),
    location: Regex::new(r"^(web|mobile)$").expect("location pattern"),
});

fn pattern_for(field: &str) -> Option<&'static Regex> {
    let p = &*PATTERNS;
    match field {
        "token" | "reset_token" => Some(&p.hex),
        "email" => Some(&p.email),
        "username" => Some(&p.username),
        "user" => Some(&p.login),
        "date" => Some(&p.date),
        "timespan" | "id" | "page" => Some(&p.digits),
        "location" => Some(&p.location),
        _ => None,
    }
}

/// Renders a body value the way it is matched against its pattern.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A parsed request body.
///
/// Anything that is not a JSON object parses to an empty field set, so a
/// malformed body fails validation like a body with missing fields.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    body: Map<String, Value>,
}

impl Fields {
    pub fn parse(raw: &[u8]) -> Self {
        let body = match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { body }
    }

    /// Checks that every field in `names` is present and well-formed.
    pub fn require(&self, names: &[&str]) -> Result<&Self, ApiError> {
        for &name in names {
            let Some(value) = self.body.get(name) else {
                tracing::debug!(field = name, "missing body field");
                return Err(ApiError::MissingFields);
            };
            if let Some(pattern) = pattern_for(name) {
                if !pattern.is_match(&as_text(value)) {
                    tracing::debug!(field = name, "body field failed its pattern");
                    return Err(ApiError::MissingFields);
                }
            }
        }
        Ok(self)
    }

    pub fn value(&self, name: &str) -> Result<&Value, ApiError> {
        self.body.get(name).ok_or(ApiError::MissingFields)
    }

    /// The field as text; numbers and booleans are stringified.
    pub fn text(&self, name: &str) -> Result<String, ApiError> {
        self.value(name).map(as_text)
    }

    pub fn int(&self, name: &str) -> Result<i64, ApiError> {
        self.text(name)?
            .parse()
            .map_err(|_| ApiError::MissingFields)
    }

    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, ApiError> {
        self.value(name)?
            .as_object()
            .ok_or(ApiError::MissingFields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        Fields::parse(v.to_string().as_bytes())
    }

    #[test]
    fn unparsable_body_counts_as_missing() {
        let f = Fields::parse(b"user=alice&password=x");
        assert!(matches!(f.require(&["user"]), Err(ApiError::MissingFields)));
        let f = Fields::parse(b"[1, 2]");
        assert!(f.require(&["user"]).is_err());
        assert!(Fields::parse(b"").require(&[]).is_ok());
    }

    #[test]
    fn login_accepts_username_or_email() {
        for user in ["module_test", "module_test@teszt.com", "a.b-c@mail.example.org"] {
            assert!(fields(json!({"user": user})).require(&["user"]).is_ok(), "{user}");
        }
        for user in ["abc", "x y z w v", "bad@", "' OR 1=1 --"] {
            assert!(fields(json!({"user": user})).require(&["user"]).is_err(), "{user}");
        }
    }

    #[test]
    fn location_is_anchored_on_both_ends() {
        let ok = |loc: &str| fields(json!({"location": loc})).require(&["location"]).is_ok();
        assert!(ok("web"));
        assert!(ok("mobile"));
        assert!(!ok("webx"));
        assert!(!ok("xmobile"));
        assert!(!ok("desktop"));
    }

    #[test]
    fn numeric_fields_accept_numbers_and_digit_strings() {
        let f = fields(json!({"id": 12, "page": "3", "timespan": -1}));
        assert!(f.require(&["id", "page"]).is_ok());
        assert_eq!(f.int("id").expect("id"), 12);
        assert_eq!(f.int("page").expect("page"), 3);
        assert!(f.require(&["timespan"]).is_err());
    }

    #[test]
    fn tokens_must_be_lowercase_hex() {
        assert!(fields(json!({"token": "00ff"})).require(&["token"]).is_ok());
        assert!(fields(json!({"token": "00FF"})).require(&["token"]).is_err());
        assert!(fields(json!({"token": ""})).require(&["token"]).is_err());
    }

    #[test]
    fn dates_allow_unpadded_parts() {
        let ok = |d: &str| fields(json!({"date": d})).require(&["date"]).is_ok();
        assert!(ok("2024-3"));
        assert!(ok("2024-03-7"));
        assert!(!ok("24-3-7"));
        assert!(!ok("2024/03/07"));
    }

    #[test]
    fn unpatterned_fields_only_need_presence() {
        let f = fields(json!({"password": "", "values": {"a": 1}}));
        assert!(f.require(&["password", "values"]).is_ok());
        assert!(f.object("values").is_ok());
        assert!(f.object("password").is_err());
        assert!(f.require(&["name"]).is_err());
    }
}
