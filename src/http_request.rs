use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{GurlzError, Result};

pub const MAX_NAME_LEN: usize = 50;

/// A named, persisted HTTP call.
///
/// Field names and the omit-when-empty rules for `headers` and `body` are the
/// on-disk format of `requests.yaml` and must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub name: String,
    pub url: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    /// Validates user input and builds a fresh request with a new id.
    ///
    /// `headers` are `"Key: Value"` strings. Nothing is built if any input is
    /// malformed.
    pub fn new<S: AsRef<str>>(
        name: &str,
        url: &str,
        method: &str,
        headers: &[S],
        body: &str,
    ) -> Result<Request> {
        validate_name(name)?;
        let method = normalize_method(method)?;
        let headers = parse_headers(headers)?;

        let now = Utc::now();
        Ok(Request {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            url: url.to_string(),
            method,
            headers,
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GurlzError::validation("request name cannot be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(GurlzError::validation("request name cannot contain spaces"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(GurlzError::validation(format!(
            "request name must be {} characters or less",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

pub fn normalize_method(method: &str) -> Result<String> {
    let method = method.trim();
    if method.is_empty() {
        return Err(GurlzError::validation("http method cannot be empty"));
    }
    Ok(method.to_uppercase())
}

/// Splits `"Key: Value"` on the first colon and trims both halves.
pub fn parse_header(header: &str) -> Result<(String, String)> {
    let invalid =
        || GurlzError::validation(format!("invalid header format: {} (expected 'Key: Value')", header));
    let (key, value) = header.split_once(':').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Later headers with the same key replace earlier ones.
pub fn parse_headers<S: AsRef<str>>(headers: &[S]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for header in headers {
        let (key, value) = parse_header(header.as_ref())?;
        map.insert(key, value);
    }
    Ok(map)
}
