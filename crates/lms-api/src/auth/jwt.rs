use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Learner,
    Instructor,
    Admin,
}

impl Role {
    /// Whether this role may change the catalog.
    pub const fn can_author(self) -> bool {
        matches!(self, Self::Instructor | Self::Admin)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Sign a token. Used by tests and local tooling; production tokens come from the identity provider.
pub fn generate_jwt_token(
    user_id: Uuid,
    email: &str,
    role: Role,
    jwt_secret: &str,
    expiry_hours: i64,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify signature and expiry, then decode the claims.
pub fn verify_jwt_token(token: &str, jwt_secret: &str) -> Result<Claims, ApiError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Auth("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_jwt_secret_minimum_32_characters_long";

    #[test]
    fn test_generate_and_verify_jwt_token() {
        let user_id = Uuid::new_v4();
        let token = generate_jwt_token(user_id, "instructor@example.com", Role::Instructor, SECRET, 24)
            .expect("Failed to generate token");

        let claims = verify_jwt_token(&token, SECRET).expect("Failed to verify token");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "instructor@example.com");
        assert_eq!(claims.role, Role::Instructor);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = generate_jwt_token(Uuid::new_v4(), "a@example.com", Role::Learner, SECRET, 24)
            .expect("Failed to generate token");

        match verify_jwt_token(&token, "wrong_jwt_secret_minimum_32_characters_long") {
            Err(ApiError::Auth(msg)) => assert!(msg.contains("Invalid or expired token")),
            other => panic!("Expected Auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = generate_jwt_token(Uuid::new_v4(), "a@example.com", Role::Learner, SECRET, -2)
            .expect("Failed to generate token");

        assert!(verify_jwt_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_role_defaults_to_learner() {
        let json = r#"{"sub":"x","email":"a@example.com","exp":1,"iat":0}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.role, Role::Learner);
        assert!(!claims.role.can_author());
        assert!(Role::Admin.can_author());
    }
}
