use crate::error::AuthError;
use crate::models::DecodedToken;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Signing-secret partition. A token of one class never decodes as another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Access,
    Refresh,
    EmailVerification,
}

pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub email_secret: String,
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
}

impl TokenConfig {
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        email_secret: String,
        issuer: String,
        audience: String,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            email_secret,
            issuer,
            audience,
            algorithm: Algorithm::HS256,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    cls: TokenClass,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
}

/// Creates and parses signed, time-bounded bearer tokens.
pub trait TokenCodec: Send + Sync {
    fn encode(
        &self,
        class: TokenClass,
        subject: &str,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError>;

    /// Signature first, then expiry. Only a correctly signed token past its
    /// expiry is `TokenExpired`; every other failure is `TokenInvalid`.
    fn decode(&self, class: TokenClass, token: &str) -> Result<DecodedToken, AuthError>;
}

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl ClassKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

pub struct JwtTokenCodec {
    access: ClassKeys,
    refresh: ClassKeys,
    email: ClassKeys,
    issuer: String,
    audience: String,
    algorithm: Algorithm,
}

impl JwtTokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            access: ClassKeys::from_secret(&config.access_secret),
            refresh: ClassKeys::from_secret(&config.refresh_secret),
            email: ClassKeys::from_secret(&config.email_secret),
            issuer: config.issuer,
            audience: config.audience,
            algorithm: config.algorithm,
        }
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
            TokenClass::EmailVerification => &self.email,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation
    }
}

impl TokenCodec for JwtTokenCodec {
    fn encode(
        &self,
        class: TokenClass,
        subject: &str,
        token_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            jti: token_id.to_string(),
            cls: class,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        jsonwebtoken::encode(
            &Header::new(self.algorithm),
            &claims,
            &self.keys(class).encoding,
        )
        .map_err(|e| {
            error!(?class, "failed to sign token: {}", e);
            AuthError::InternalError("token signing failed".to_string())
        })
    }

    fn decode(&self, class: TokenClass, token: &str) -> Result<DecodedToken, AuthError> {
        let claims = jsonwebtoken::decode::<Claims>(
            token,
            &self.keys(class).decoding,
            &self.validation(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            kind => {
                debug!(?class, ?kind, "token rejected");
                AuthError::TokenInvalid
            }
        })?;

        if claims.cls != class {
            debug!(expected = ?class, found = ?claims.cls, "token class mismatch");
            return Err(AuthError::TokenInvalid);
        }

        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::TokenInvalid)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::TokenInvalid)?;

        Ok(DecodedToken {
            subject: claims.sub,
            token_id: claims.jti,
            issued_at,
            expires_at,
        })
    }
}
