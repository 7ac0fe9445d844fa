/// Maximum page size allowed on any list endpoint
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// PAGE SIZES
// =============================================================================

pub const CATEGORY_PAGE_SIZE: i64 = 25;
pub const RESOURCE_PAGE_SIZE: i64 = 15;
pub const REVIEW_PAGE_SIZE: i64 = 10;
pub const REPORT_PAGE_SIZE: i64 = 20;
pub const GROUP_PAGE_SIZE: i64 = 20;
pub const CHAT_MESSAGE_PAGE_SIZE: i64 = 50;
pub const USER_PAGE_SIZE: i64 = 15;

/// Resources listed on a category detail page
pub const CATEGORY_SAMPLE_RESOURCES: i64 = 10;

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

pub const MAX_RESOURCE_FILE_SIZE: usize = 20 * 1024 * 1024; // 20MB
pub const MAX_IMAGE_SIZE: usize = 2 * 1024 * 1024; // 2MB

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

// =============================================================================
// AI SEARCH
// =============================================================================

pub const AI_SEARCH_RESULT_LIMIT: i64 = 7;
pub const AI_SEARCH_REVIEWS_PER_RESOURCE: usize = 5;
pub const AI_SUMMARY_FALLBACK: &str = "AI summary could not be generated for this item.";
