mod review;

pub use review::{Review, ReviewRating, ReviewStatus};
