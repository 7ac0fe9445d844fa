use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::shared::validation::not_blank;

fn passwords_match(dto: &RegisterRequestDto) -> Result<(), ValidationError> {
    if dto.password != dto.c_password {
        return Err(ValidationError::new("same")
            .with_message("c_password and password must match".into()));
    }
    Ok(())
}

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct RegisterRequestDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Must repeat `password`
    pub c_password: String,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response DTO for authentication (register/login)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponseDto {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, confirm: &str) -> RegisterRequestDto {
        RegisterRequestDto {
            name: "Sara".to_string(),
            email: "sara@example.com".to_string(),
            password: password.to_string(),
            c_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_register_requires_matching_confirmation() {
        assert!(register("secret1", "secret1").validate().is_ok());
        assert!(register("secret1", "secret2").validate().is_err());
    }

    #[test]
    fn test_register_rejects_short_password() {
        let errors = register("123", "123").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_login_requires_password() {
        let dto = LoginRequestDto {
            email: "sara@example.com".to_string(),
            password: String::new(),
        };
        assert!(dto.validate().is_err());
    }
}
