use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;

use crate::models::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    pub fn generate_token(user_id: &ObjectId, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        let secret = crate::config::Config::jwt_secret();
        let expiry = crate::config::Config::jwt_expiry();
        Self::sign(user_id, role, &secret, expiry)
    }

    pub fn verify_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = crate::config::Config::jwt_secret();
        Self::verify_with(token, &secret)
    }

    fn sign(user_id: &ObjectId, role: Role, secret: &str, expiry: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user_id.to_hex(),
            role,
            exp: now + expiry,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    fn verify_with(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_subject_and_role() {
        let id = ObjectId::new();
        let token = JwtService::sign(&id, Role::Worker, "s3cret", 60).unwrap();
        let claims = JwtService::verify_with(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, id.to_hex());
        assert_eq!(claims.role, Role::Worker);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtService::sign(&ObjectId::new(), Role::Customer, "s3cret", 60).unwrap();
        assert!(JwtService::verify_with(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // well past the default 60s leeway
        let token = JwtService::sign(&ObjectId::new(), Role::Customer, "s3cret", -3600).unwrap();
        assert!(JwtService::verify_with(&token, "s3cret").is_err());
    }
}
