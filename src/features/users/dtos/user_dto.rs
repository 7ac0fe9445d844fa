use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::core::error::Result;
use crate::features::auth::model::Role;
use crate::features::users::models::User;
use crate::modules::storage::ObjectStore;
use crate::shared::upload::MultipartForm;
use crate::shared::validation::not_blank;

/// Public view of an account. The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponseDto {
    pub fn from_model(user: &User, storage: &dyn ObjectStore) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_image_url: user.profile_image.as_deref().map(|key| storage.url(key)),
            bio: user.bio.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// Substring of name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Admin request to create an account
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Role,
}

/// Admin request to change an account; absent fields are left unchanged
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    pub role: Option<Role>,
}

// =============================================================================
// ACCOUNT (SELF-SERVICE)
// =============================================================================

/// Multipart body for `PUT /api/account`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UpdateAccountForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub profile_image: Option<Vec<u8>>,
    pub clear_profile_image: Option<bool>,
}

#[derive(Debug, Validate)]
pub struct UpdateAccountDto {
    #[validate(length(min = 1, max = 255), custom(function = "not_blank"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"), length(max = 255))]
    pub email: Option<String>,

    /// `Some("")` clears the bio
    #[validate(length(max = 1000))]
    pub bio: Option<String>,

    pub clear_profile_image: bool,
}

impl UpdateAccountDto {
    pub fn from_form(form: &MultipartForm) -> Result<Self> {
        let dto = Self {
            name: form.non_empty_text("name").map(|n| n.trim().to_string()),
            email: form
                .non_empty_text("email")
                .map(|e| e.trim().to_lowercase()),
            bio: form.text("bio").map(|b| b.trim().to_string()),
            clear_profile_image: form.flag("clear_profile_image"),
        };
        dto.validate()?;
        Ok(dto)
    }
}

fn passwords_match(dto: &ChangePasswordDto) -> std::result::Result<(), ValidationError> {
    if dto.password != dto.password_confirmation {
        return Err(ValidationError::new("confirmed")
            .with_message("password confirmation does not match".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub password_confirmation: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteAccountDto {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    fn user() -> User {
        User {
            id: Uuid::now_v7(),
            name: "Sara".to_string(),
            email: "sara@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::User,
            profile_image: Some("public/profiles/a.png".to_string()),
            bio: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_hides_password_hash() {
        let dto = UserResponseDto::from_model(&user(), &MemoryStore::default());
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(
            json["profile_image_url"],
            "http://storage.test/bucket/public/profiles/a.png"
        );
    }

    #[test]
    fn test_create_defaults_to_user_role() {
        let dto: CreateUserDto = serde_json::from_value(serde_json::json!({
            "name": "Ali",
            "email": "ali@example.com",
            "password": "secret1"
        }))
        .unwrap();
        assert_eq!(dto.role, Role::User);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_short_password_and_bad_email() {
        let dto = CreateUserDto {
            name: "Ali".to_string(),
            email: "not-an-email".to_string(),
            password: "12345".to_string(),
            role: Role::Admin,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_value::<CreateUserDto>(serde_json::json!({
            "name": "Ali",
            "email": "ali@example.com",
            "password": "secret1",
            "role": "superuser"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_password_confirmation_must_match() {
        let dto = ChangePasswordDto {
            current_password: "old-pass".to_string(),
            password: "new-pass".to_string(),
            password_confirmation: "other".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_account_form_normalizes_email() {
        let form = MultipartForm::from_parts(
            &[("email", " Sara@Example.COM "), ("bio", ""), ("name", "")],
            vec![],
        );
        let dto = UpdateAccountDto::from_form(&form).unwrap();
        assert_eq!(dto.email.as_deref(), Some("sara@example.com"));
        assert_eq!(dto.bio.as_deref(), Some(""));
        assert_eq!(dto.name, None);
    }
}
