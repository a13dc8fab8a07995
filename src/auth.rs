// src/auth.rs
//! Bearer-token gate for the triage endpoints.
//!
//! Tokens are `<subject>.<expiry unix secs>.<hex hmac-sha256(secret, subject "." expiry)>`.
//! Minting normally happens in the login service; `issue` exists for that
//! collaborator and for tests.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token provided")]
    Missing,
    #[error("invalid token: {0}")]
    Invalid(&'static str),
    #[error("token expired")]
    Expired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        counter!("auth_rejected_total").increment(1);
        tracing::debug!(target: "auth", error = %self, "request rejected");
        let message = match self {
            AuthError::Missing => "No token provided",
            AuthError::Invalid(_) | AuthError::Expired => "Invalid token",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
    }
}

/// Verified token contents, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct TokenAuthority {
    secret: String,
    ttl_secs: i64,
}

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, payload: &str) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthError::Invalid("unusable secret"))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

impl TokenAuthority {
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    pub fn issue(&self, subject: &str) -> String {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, subject: &str, now: i64) -> String {
        let payload = format!("{subject}.{}", now + self.ttl_secs);
        // Hmac takes keys of any length.
        let sig = mac_for(&self.secret, &payload)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{payload}.{sig}")
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        if !self.is_configured() {
            return Err(AuthError::Invalid("auth secret not configured"));
        }
        // Split from the right: subjects (emails) may contain dots.
        let mut parts = token.rsplitn(3, '.');
        let (Some(sig), Some(expiry), Some(subject)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Invalid("malformed"));
        };
        if subject.is_empty() {
            return Err(AuthError::Invalid("empty subject"));
        }
        let expires_at: i64 = expiry.parse().map_err(|_| AuthError::Invalid("bad expiry"))?;

        let sig = hex::decode(sig).map_err(|_| AuthError::Invalid("bad signature"))?;
        mac_for(&self.secret, &format!("{subject}.{expiry}"))?
            .verify_slice(&sig)
            .map_err(|_| AuthError::Invalid("bad signature"))?;
        if now >= expires_at {
            return Err(AuthError::Expired);
        }
        Ok(Claims {
            subject: subject.to_string(),
            expires_at,
        })
    }
}

/// `Authorization: Bearer <token>` → token. `Err(Missing)` when either part is absent.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Missing)?;
    let mut it = header.split_whitespace();
    let scheme = it.next().ok_or(AuthError::Missing)?;
    let token = it.next().ok_or(AuthError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Invalid("unsupported scheme"));
    }
    Ok(token)
}

/// Axum middleware guarding protected routes.
pub async fn require_bearer(
    State(auth): State<Arc<TokenAuthority>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header)?;
    let claims = auth.verify(token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn issued_token_verifies() {
        let a = TokenAuthority::new("s3cret", 3600);
        let t = a.issue_at("jane.doe@example.org", NOW);
        let c = a.verify_at(&t, NOW + 10).unwrap();
        assert_eq!(c.subject, "jane.doe@example.org");
        assert_eq!(c.expires_at, NOW + 3600);
    }

    #[test]
    fn expired_tampered_and_foreign_tokens_fail() {
        let a = TokenAuthority::new("s3cret", 3600);
        let t = a.issue_at("user-1", NOW);
        assert_eq!(a.verify_at(&t, NOW + 3600), Err(AuthError::Expired));

        let tampered = t.replacen("user-1", "user-2", 1);
        assert!(matches!(a.verify_at(&tampered, NOW), Err(AuthError::Invalid(_))));

        let other = TokenAuthority::new("different", 3600);
        assert!(matches!(other.verify_at(&t, NOW), Err(AuthError::Invalid(_))));

        assert!(matches!(a.verify_at("garbage", NOW), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn signature_is_hmac_sha256_of_subject_and_expiry() {
        let a = TokenAuthority::new("s3cret", 60);
        let t = a.issue_at("ops", NOW);
        let sig = t.rsplit('.').next().unwrap();

        let mut mac = HmacSha256::new_from_slice(b"s3cret").unwrap();
        mac.update(format!("ops.{}", NOW + 60).as_bytes());
        assert_eq!(sig, hex::encode(mac.finalize().into_bytes()));

        // A bare keyed digest over the same payload is not a valid signature.
        use sha2::Digest;
        let naive = hex::encode(Sha256::digest(format!("s3cret:ops.{}", NOW + 60)));
        let forged = format!("ops.{}.{naive}", NOW + 60);
        assert_eq!(a.verify_at(&forged, NOW), Err(AuthError::Invalid("bad signature")));
        assert_eq!(
            a.verify_at(&format!("ops.{}.zz", NOW + 60), NOW),
            Err(AuthError::Invalid("bad signature"))
        );
    }

    #[test]
    fn unconfigured_secret_rejects_everything() {
        let a = TokenAuthority::new("", 3600);
        let t = a.issue_at("user-1", NOW);
        assert!(matches!(a.verify_at(&t, NOW), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer  abc")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(AuthError::Missing));
        assert_eq!(bearer_token(Some("Bearer")), Err(AuthError::Missing));
        assert!(matches!(bearer_token(Some("Basic abc")), Err(AuthError::Invalid(_))));
    }
}
