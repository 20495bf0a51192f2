use chrono::Utc;
use jsonwebtoken::{DecodingKey, Validation};
use uuid::Uuid;

use crate::errors::ApiError;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Decode a token's claims without verifying the signature.
///
/// The client never holds the signing secret; the server remains the
/// authority on token validity. Peeked claims are used only for display
/// (`vantage status`) and debug logging of an already-expired token.
pub fn peek_claims(token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|err| ApiError::decode(format!("malformed token: {err}")))
}

pub fn is_expired(token: &str) -> bool {
    match peek_claims(token) {
        Ok(claims) => (claims.exp as i64) <= Utc::now().timestamp(),
        Err(_) => false,
    }
}
