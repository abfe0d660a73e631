//! Browser sessions: a signed cookie carrying a session id.
//!
//! Cookie value: `<uuid>.<hex HMAC-SHA256(secret, uuid)>`. A missing or tampered
//! cookie yields a fresh session and a `Set-Cookie` header on the response.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    response::{IntoResponseParts, ResponseParts},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Environment;
use crate::models::GeneratedContent;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "wa_session";

type HmacSha256 = Hmac<Sha256>;

/// Signs a session id for the cookie.
pub fn sign(secret: &[u8], id: Uuid) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(id.as_bytes());
    Some(format!("{id}.{}", hex::encode(mac.finalize().into_bytes())))
}

/// Returns the session id if the cookie value carries a valid signature.
pub fn verify(secret: &[u8], value: &str) -> Option<Uuid> {
    let (id, signature) = value.split_once('.')?;
    let id = Uuid::parse_str(id).ok()?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(id.as_bytes());
    mac.verify_slice(&signature).ok()?;
    Some(id)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// The caller's session. Extracting it never fails; returning it from a
/// handler sets the cookie when the session is new.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    set_cookie: Option<HeaderValue>,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let secret = state.config.secret_key.as_bytes();

        if let Some(raw) = cookie_value(&parts.headers, SESSION_COOKIE) {
            if let Some(id) = verify(secret, raw) {
                return Ok(Session { id, set_cookie: None });
            }
            warn!("Rejected session cookie with invalid signature");
        }

        let id = Uuid::new_v4();
        debug!("Starting session {id}");

        let set_cookie = sign(secret, id).and_then(|value| {
            let mut cookie = format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax");
            if state.config.environment == Environment::Production {
                cookie.push_str("; Secure");
            }
            HeaderValue::from_str(&cookie).ok()
        });
        if set_cookie.is_none() {
            warn!("Could not sign cookie for session {id}");
        }

        Ok(Session { id, set_cookie })
    }
}

impl IntoResponseParts for Session {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.set_cookie {
            res.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(res)
    }
}

/// Most recent generated content per session. In memory only.
#[derive(Clone, Default)]
pub struct ResultStore {
    inner: Arc<DashMap<Uuid, GeneratedContent>>,
}

impl ResultStore {
    pub fn put(&self, session: Uuid, content: GeneratedContent) {
        self.inner.insert(session, content);
    }

    pub fn get(&self, session: Uuid) -> Option<GeneratedContent> {
        self.inner.get(&session).map(|c| c.value().clone())
    }

    /// Drops entries created before `cutoff`; returns how many were removed.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, content| content.created_at >= cutoff);
        before - self.inner.len()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
