use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::model::{AuthenticatedUser, Claims, Role};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;

/// Issues and validates the API's own access tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: u64,
    leeway: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl_secs: config.token_ttl.as_secs(),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    pub fn issue(&self, user_id: Uuid, name: &str, role: Role) -> Result<String, AppError> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = self.leeway;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid access token: {}", e)))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            name: data.claims.name,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            issuer: "test-issuer".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(0),
        }
    }

    #[test]
    fn test_issued_token_validates_to_same_user() {
        let service = TokenService::new(&config("0123456789abcdef0123456789abcdef"));
        let id = Uuid::now_v7();

        let token = service.issue(id, "Sara", Role::Admin).unwrap();
        let user = service.validate(&token).unwrap();

        assert_eq!(user.user_id, id);
        assert_eq!(user.name, "Sara");
        assert!(user.is_admin());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenService::new(&config("0123456789abcdef0123456789abcdef"));
        let verifier = TokenService::new(&config("ffffffffffffffffffffffffffffffff"));

        let token = issuer.issue(Uuid::now_v7(), "Ali", Role::User).unwrap();
        let err = verifier.validate(&token).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("0123456789abcdef0123456789abcdef");
        let service = TokenService::new(&cfg);

        let claims = Claims {
            sub: Uuid::now_v7().to_string(),
            name: "Old".to_string(),
            role: Role::User,
            iss: "test-issuer".to_string(),
            iat: 1_000,
            exp: 1_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(service.validate(&token).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = TokenService::new(&config("0123456789abcdef0123456789abcdef"));
        assert!(matches!(
            service.validate("not-a-jwt"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
