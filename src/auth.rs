//! Password hashing, JWT sessions and the authenticated-user extractor

use crate::error::{AppError, AppResult};
use crate::AppState;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use argon2::Config as ArgonConfig;
use chrono::{Duration, Utc};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material and token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn ttl_hours(&self) -> i64 {
        self.ttl_hours
    }
}

/// Hash a password into an encoded argon2 string with a random salt
pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(plain.as_bytes(), &salt, &config)
        .map_err(|e| AppError::Message(format!("Password hashing failed: {}", e)))
}

/// False on mismatch and on malformed hashes
pub fn verify_password(hash: &str, plain: &str) -> bool {
    argon2::verify_encoded(hash, plain.as_bytes()).unwrap_or(false)
}

/// Issue an HS256 session token
pub fn issue_token(user_id: Uuid, username: &str, keys: &JwtKeys) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(keys.ttl_hours)).timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|e| AppError::Message(format!("Failed to encode token: {}", e)))
}

/// Validate signature and expiry
pub fn decode_token(token: &str, keys: &JwtKeys) -> AppResult<Claims> {
    decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected token: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string())
        })
}

/// Session cookie carrying the token
pub fn session_cookie(token: String, keys: &JwtKeys, secure: bool) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::hours(keys.ttl_hours))
        .finish()
}

/// Expired cookie that makes the browser drop the session
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}

/// Bearer header first, then the session cookie
fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        req.cookie(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// The signed-in caller. Rejects the request with 401 when the token is
/// missing or invalid; use `Option<AuthUser>` where signing in is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl AuthUser {
    fn from_request_sync(req: &HttpRequest) -> AppResult<Self> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| AppError::Config("Application state not configured".to_string()))?;

        let token = token_from_request(req)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        let claims = decode_token(&token, &state.jwt)?;

        Ok(Self {
            id: claims.sub,
            username: claims.username,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_request_sync(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret-that-is-long-enough-for-hs256", 24)
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "correct horse battery"));
        assert!(!verify_password(&hash, "wrong horse battery"));
        assert!(!verify_password("not-a-hash", "anything"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_round_trip() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "jane", &keys).unwrap();
        let claims = decode_token(&token, &keys).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "jane");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), "jane", &keys()).unwrap();
        let other = JwtKeys::new("a-completely-different-secret-value!!", 24);
        let err = decode_token(&token, &other).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let expired = JwtKeys::new("test-secret-that-is-long-enough-for-hs256", -2);
        let token = issue_token(Uuid::new_v4(), "jane", &expired).unwrap();
        assert!(decode_token(&token, &keys()).is_err());
    }

    #[test]
    fn test_token_extraction_prefers_bearer() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer header-token"))
            .cookie(Cookie::new(TOKEN_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("header-token"));

        let req = TestRequest::default()
            .cookie(Cookie::new(TOKEN_COOKIE, "cookie-token"))
            .to_http_request();
        assert_eq!(token_from_request(&req).as_deref(), Some("cookie-token"));

        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(token_from_request(&req), None);
    }

    #[test]
    fn test_cookies() {
        let cookie = session_cookie("tok".into(), &keys(), true);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));

        let removal = removal_cookie(false);
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(CookieDuration::ZERO));
    }
}
