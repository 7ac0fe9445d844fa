use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::reviews::models::{ReviewRating, ReviewStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewAuthorDto {
    pub id: Uuid,
    pub name: String,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResourceDto {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub comment: String,
    pub rating: ReviewRating,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ReviewAuthorDto,
    pub resource: ReviewResourceDto,
}

/// Status filter accepted by the listings; `all` disables filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatusFilter {
    All,
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatusFilter {
    pub fn status(self) -> Option<ReviewStatus> {
        match self {
            ReviewStatusFilter::All => None,
            ReviewStatusFilter::Pending => Some(ReviewStatus::Pending),
            ReviewStatusFilter::Approved => Some(ReviewStatus::Approved),
            ReviewStatusFilter::Rejected => Some(ReviewStatus::Rejected),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReviewsQuery {
    pub resource_id: Uuid,
    /// Honoured for admins only; everyone else sees approved reviews
    pub status: Option<ReviewStatusFilter>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminListReviewsQuery {
    pub resource_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<ReviewStatusFilter>,
    /// Substring of the comment
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Filters resolved for one listing
#[derive(Debug, Default)]
pub struct ReviewFilter {
    pub resource_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<ReviewStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    pub resource_id: Uuid,

    #[validate(length(min = 10, max = 5000, message = "Comment must be 10-5000 characters"))]
    pub comment: String,

    pub rating: ReviewRating,
}

/// Absent fields are left unchanged. Only admins may send `status`.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewDto {
    #[validate(length(min = 10, max = 5000, message = "Comment must be 10-5000 characters"))]
    pub comment: Option<String>,

    pub rating: Option<ReviewRating>,

    pub status: Option<ReviewStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_filter_all_disables_filter() {
        let f: ReviewStatusFilter = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(f.status(), None);
        let f: ReviewStatusFilter = serde_json::from_value(json!("rejected")).unwrap();
        assert_eq!(f.status(), Some(ReviewStatus::Rejected));
    }

    #[test]
    fn test_comment_length_bounds() {
        let dto = CreateReviewDto {
            resource_id: Uuid::now_v7(),
            comment: "too short".to_string(),
            rating: ReviewRating::Liked,
        };
        assert!(dto.validate().is_err());

        let dto = CreateReviewDto {
            comment: "long enough comment".to_string(),
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_rating_must_be_known() {
        let parsed = serde_json::from_value::<CreateReviewDto>(json!({
            "resource_id": Uuid::now_v7(),
            "comment": "a perfectly fine comment",
            "rating": "loved"
        }));
        assert!(parsed.is_err());
    }
}
