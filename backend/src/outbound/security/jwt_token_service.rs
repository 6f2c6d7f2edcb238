//! HS256 bearer tokens signed with a shared secret.
//!
//! Expiry is checked against the injected [`Clock`] rather than the system
//! time so tests can move time forward.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ports::{AccessTokenService, TokenError};
use crate::domain::{IssuedToken, TokenSubject, UserId};

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
            clock,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);
        validation
    }
}

impl AccessTokenService for JwtTokenService {
    fn issue(&self, user_id: &UserId) -> Result<IssuedToken, TokenError> {
        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.ttl;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::signing(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        let claims = jsonwebtoken::decode::<AccessClaims>(token, &self.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            })?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::invalid("exp out of range"))?;
        if self.clock.utc() >= expires_at {
            return Err(TokenError::expired());
        }

        let user_id = UserId::new(&claims.sub).map_err(|err| TokenError::invalid(err.to_string()))?;
        Ok(TokenSubject { user_id })
    }
}
