//! Field checks shared by every handler.
//!
//! Clients send identifiers either as JSON numbers or as numeric strings,
//! and read leading-integer prefixes (`"12abc"` is 12). A value that is
//! absent, `null`, `false`, `0` or `""` counts as missing.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// JSON body extractor whose rejection uses the API error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request("INVALID_JSON", rejection.body_text())),
        }
    }
}

/// Leading-integer parse: optional whitespace, optional sign, digits.
/// Trailing garbage is ignored; no digits at all is `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    rest[..digits].parse::<i64>().ok().map(|n| sign * n)
}

pub fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

/// JavaScript-style falsiness for a body field.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Identifier taken from a JSON body.
pub fn body_id(
    value: Option<&Value>,
    field: &str,
    missing_code: &'static str,
    invalid_code: &'static str,
) -> ApiResult<i64> {
    if is_missing(value) {
        return Err(ApiError::bad_request(missing_code, format!("{} is required", field)));
    }
    value.and_then(int_from_value).ok_or_else(|| {
        ApiError::bad_request(invalid_code, format!("{} must be a valid integer", field))
    })
}

/// Identifier taken from a query string parameter.
pub fn query_id(
    raw: Option<&str>,
    field: &str,
    missing_code: &'static str,
    invalid_code: &'static str,
) -> ApiResult<i64> {
    let raw = raw.filter(|s| !s.is_empty()).ok_or_else(|| {
        ApiError::bad_request(missing_code, format!("{} query parameter is required", field))
    })?;
    parse_int_prefix(raw).ok_or_else(|| {
        ApiError::bad_request(invalid_code, format!("{} must be a valid integer", field))
    })
}

/// Identifier taken from the URL path. Must be positive.
pub fn path_id(raw: &str, code: &'static str, what: &str) -> ApiResult<i64> {
    parse_int_prefix(raw)
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(code, format!("Valid {} ID is required", what)))
}

/// Non-empty trimmed string. Whitespace-only counts as missing.
pub fn required_text(
    value: Option<&Value>,
    field: &str,
    missing_code: &'static str,
    invalid_code: &'static str,
) -> ApiResult<String> {
    if is_missing(value) {
        return Err(ApiError::bad_request(missing_code, format!("{} is required", field)));
    }
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::String(_)) => Err(ApiError::bad_request(
            missing_code,
            format!("{} cannot be empty", field),
        )),
        _ => Err(ApiError::bad_request(invalid_code, format!("{} must be a string", field))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Unparsable values fall back to the defaults; `limit` is clamped to `[0, cap]`.
    pub fn from_query(limit: Option<&str>, offset: Option<&str>, default: i64, cap: i64) -> Self {
        let limit = limit.and_then(parse_int_prefix).unwrap_or(default).clamp(0, cap);
        let offset = offset.and_then(parse_int_prefix).unwrap_or(0).max(0);
        Self { limit, offset }
    }
}
