//! Access token issuance/validation. Scoped down from the teacher's
//! `users::auth::jwt`: one signing key from `Config` (no rotation, no
//! blacklist table — this spec carries no session-revocation component),
//! same `Claims`/`encode`/`decode` shape otherwise.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use longbox_model::ids::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub exp: i64,
    pub iat: i64,
}

pub fn generate_access_token(secret: &str, ttl_minutes: i64, user_id: UserId) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.as_uuid(),
        exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_the_subject() {
        let user_id = UserId::new();
        let token = generate_access_token("test-secret", 60, user_id).unwrap();
        let claims = validate_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, user_id.as_uuid());
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let token = generate_access_token("one-secret", 60, UserId::new()).unwrap();
        assert!(validate_token("another-secret", &token).is_err());
    }
}
