//! Modules layer - Infrastructure components for external integrations
//!
//! Clients and adapters for object storage and text generation.

pub mod ai;
pub mod storage;
