use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Username
    pub iat: i64,
    pub exp: i64,
}

/// Signing parameters taken from `AuthConfig`.
#[derive(Clone)]
pub struct JwtSettings<'a> {
    pub secret: &'a str,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

/// Sign a new token for `username`.
pub fn sign(username: &str, settings: &JwtSettings<'_>) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_owned(),
        iat: now.timestamp(),
        exp: (now + settings.ttl).timestamp(),
    };

    encode(
        &Header::new(settings.algorithm),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )
}

/// Verify signature and expiry, returning the claims.
pub fn verify(token: &str, settings: &JwtSettings<'_>) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(settings.algorithm);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}
