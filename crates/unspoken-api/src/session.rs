//! Bearer session tokens.
//!
//! Users are anonymous, so a token is issued at account creation and is the
//! only proof of identity. Requests without a token are accepted unless
//! `require_session` is set; requests with one may only act as its subject.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use unspoken_types::api::Claims;
use unspoken_types::models::User;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub jwt_secret: String,
    pub ttl_days: i64,
    pub require_session: bool,
}

impl SessionSettings {
    /// Longest token lifetime accepted from configuration.
    pub const MAX_TTL_DAYS: i64 = 3650;
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".into(),
            ttl_days: 30,
            require_session: false,
        }
    }
}

/// Decoded bearer token for the current request, if one was sent.
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<Claims>);

impl Session {
    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }

    /// Allows the request to act as `user_id`.
    pub fn authorize(&self, settings: &SessionSettings, user_id: i64) -> ApiResult<()> {
        match &self.0 {
            Some(claims) if claims.sub == user_id => Ok(()),
            Some(_) => Err(ApiError::forbidden(
                "SESSION_USER_MISMATCH",
                "Session does not belong to this user",
            )),
            None => require_if_configured(settings),
        }
    }
}

pub fn require_if_configured(settings: &SessionSettings) -> ApiResult<()> {
    if settings.require_session {
        Err(ApiError::unauthorized("SESSION_REQUIRED", "A session token is required"))
    } else {
        Ok(())
    }
}

fn expiry(ttl_days: i64) -> anyhow::Result<usize> {
    let ttl = TimeDelta::try_days(ttl_days)
        .filter(|ttl| *ttl > TimeDelta::zero())
        .ok_or_else(|| anyhow::anyhow!("Session lifetime of {} days is out of range", ttl_days))?;
    let expires = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| anyhow::anyhow!("Session expiry overflows for {} days", ttl_days))?;
    Ok(usize::try_from(expires.timestamp())?)
}

pub fn issue_token(settings: &SessionSettings, user: &User) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: expiry(settings.ttl_days)?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify_token(settings: &SessionSettings, token: &str) -> ApiResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::unauthorized("INVALID_SESSION", "Session token is invalid or expired"))
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<Option<&str>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(Some)
        .ok_or_else(|| ApiError::unauthorized("INVALID_SESSION", "Authorization must be a Bearer token"))
}

/// Decode an optional bearer token and attach it as a `Session` extension.
pub async fn attach_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = match bearer_token(req.headers())? {
        Some(token) => Some(verify_token(&state.sessions, token)?),
        None => None,
    };

    req.extensions_mut().insert(Session(claims));
    Ok(next.run(req).await)
}
