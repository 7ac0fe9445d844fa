use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{self, model as auth_model};
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::chat_messages::{dtos as chat_dtos, handlers as chat_handlers};
use crate::features::groups::{dtos as groups_dtos, handlers as groups_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::resources::{
    dtos as resources_dtos, handlers as resources_handlers, models as resources_models,
};
use crate::features::reviews::{
    dtos as reviews_dtos, handlers as reviews_handlers, models as reviews_models,
};
use crate::features::search::{dtos as search_dtos, handlers as search_handlers};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        // Account
        users_handlers::get_account,
        users_handlers::update_account,
        users_handlers::change_password,
        users_handlers::delete_account,
        // Users (admin)
        users_handlers::list_users,
        users_handlers::create_user,
        users_handlers::get_user,
        users_handlers::update_user,
        users_handlers::delete_user,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::list_categories_flat,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Resources
        resources_handlers::list_resources,
        resources_handlers::my_resources,
        resources_handlers::create_resource,
        resources_handlers::get_resource,
        resources_handlers::update_resource,
        resources_handlers::delete_resource,
        resources_handlers::download_resource,
        // Reviews
        reviews_handlers::list_reviews,
        reviews_handlers::admin_list_reviews,
        reviews_handlers::create_review,
        reviews_handlers::get_review,
        reviews_handlers::update_review,
        reviews_handlers::delete_review,
        // Reports
        reports_handlers::list_reports,
        reports_handlers::create_report,
        reports_handlers::update_report,
        reports_handlers::delete_report,
        // Groups
        groups_handlers::list_groups,
        groups_handlers::my_groups,
        groups_handlers::create_group,
        groups_handlers::get_group,
        groups_handlers::update_group,
        groups_handlers::delete_group,
        // Chat messages
        chat_handlers::list_chat_messages,
        chat_handlers::create_chat_message,
        chat_handlers::update_chat_message,
        chat_handlers::delete_chat_message,
        // Search
        search_handlers::ai_search,
    ),
    components(
        schemas(
            Meta,
            ApiResponse<()>,
            auth_model::Role,
            auth_model::AuthenticatedUser,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            users_dtos::UserResponseDto,
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            users_dtos::UpdateAccountForm,
            users_dtos::ChangePasswordDto,
            users_dtos::DeleteAccountDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CategoryFlatDto,
            categories_dtos::CategoryParentDto,
            categories_dtos::CategoryResourceOwnerDto,
            categories_dtos::CategoryResourceDto,
            categories_dtos::CategoryDetailDto,
            categories_dtos::CreateCategoryForm,
            categories_dtos::UpdateCategoryForm,
            resources_models::ResourceStatus,
            resources_dtos::ResourceOwnerDto,
            resources_dtos::ResourceCategoryDto,
            resources_dtos::ResourceResponseDto,
            resources_dtos::CreateResourceForm,
            resources_dtos::UpdateResourceForm,
            reviews_models::ReviewRating,
            reviews_models::ReviewStatus,
            reviews_dtos::ReviewStatusFilter,
            reviews_dtos::ReviewAuthorDto,
            reviews_dtos::ReviewResourceDto,
            reviews_dtos::ReviewResponseDto,
            reviews_dtos::CreateReviewDto,
            reviews_dtos::UpdateReviewDto,
            reports_models::ReportStatus,
            reports_dtos::ReportUserDto,
            reports_dtos::ReportResourceDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::CreateReportDto,
            reports_dtos::UpdateReportDto,
            groups_dtos::GroupOwnerDto,
            groups_dtos::GroupResponseDto,
            groups_dtos::CreateGroupForm,
            groups_dtos::UpdateGroupForm,
            chat_dtos::ChatAuthorDto,
            chat_dtos::ChatReplyAuthorDto,
            chat_dtos::ChatReplyToDto,
            chat_dtos::ChatResourceDto,
            chat_dtos::ChatMessageResponseDto,
            chat_dtos::CreateChatMessageDto,
            chat_dtos::UpdateChatMessageDto,
            search_dtos::AiSearchRequestDto,
            search_dtos::AiSearchResultDto,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and the current user"),
        (name = "account", description = "Self-service profile, password and account removal"),
        (name = "users", description = "User management (admin only)"),
        (name = "categories", description = "Hierarchical resource categories"),
        (name = "resources", description = "Shared educational resources and their files"),
        (name = "reviews", description = "Resource reviews and moderation"),
        (name = "reports", description = "Resource reports (triage is admin only)"),
        (name = "groups", description = "Study groups"),
        (name = "chat-messages", description = "Group chat"),
        (name = "search", description = "AI-assisted resource search"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Jozveh Dan API",
        version = "0.1.0",
        description = "API documentation for the Jozveh Dan resource platform",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_feature_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/register",
            "/api/categories",
            "/api/categories-all-flat",
            "/api/categories/{id}",
            "/api/resources/{id}/download",
            "/api/admin/reviews",
            "/api/reports",
            "/api/groups",
            "/api/chat-messages/{id}",
            "/api/ai-search",
            "/api/account/password",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
