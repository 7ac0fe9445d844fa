mod resource_service;

pub use resource_service::{ResourceDownload, ResourceService};
