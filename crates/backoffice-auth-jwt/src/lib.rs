//! HS256 JWT support for backoffice.
//!
//! Implements [`backoffice_auth::TokenValidator`] for tokens signed with a
//! shared secret, and issues those tokens on login:
//! - [`JwtTokenValidator`]: signature, `exp`, `iss` and optional `aud` checks
//! - [`TokenIssuer`]: signs `sub`/`email`/`iss`/`iat`/`exp` claims

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use backoffice_auth::{AuthConfig, AuthError, AuthenticatedPrincipal, TokenValidator};
use backoffice_core::PrincipalId;

/// Claims carried by backoffice access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<String>,
    iat: i64,
    exp: i64,
}

/// Validates HS256 bearer tokens.
pub struct JwtTokenValidator {
    key: DecodingKey,
}

impl JwtTokenValidator {
    /// Create a validator for tokens signed with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    fn validate_token(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = config.leeway_secs;
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<Claims>(token, &self.key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_)
                | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                    AuthError::InvalidFormat(e.to_string())
                }
                _ => AuthError::InvalidSignature(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        let subject = claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| AuthError::InvalidSubject(claims.sub.clone()))?;

        Ok(AuthenticatedPrincipal {
            subject,
            email: claims.email,
        })
    }
}

impl TokenValidator for JwtTokenValidator {
    fn validate(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Pin<Box<dyn Future<Output = Result<AuthenticatedPrincipal, AuthError>> + Send + '_>> {
        let result = self.validate_token(token, config);
        Box::pin(async move { result })
    }
}

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The compact JWT.
    pub token: String,
    /// Expiry as a Unix timestamp.
    pub expires_at: i64,
}

/// Signs HS256 access tokens.
pub struct TokenIssuer {
    key: EncodingKey,
    issuer: String,
    audience: Option<String>,
    ttl: Duration,
}

impl TokenIssuer {
    /// Issuer signing with `secret`; tokens carry `config.issuer` and live for `ttl`.
    pub fn new(secret: &[u8], config: &AuthConfig, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl,
        }
    }

    /// Sign a token for `subject`.
    pub fn issue(&self, subject: PrincipalId, email: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Issue(e.to_string()))?;
        log::debug!("issued token for {subject}");

        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
        })
    }
}
