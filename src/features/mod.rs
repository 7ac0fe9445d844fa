//! Feature modules. Each one owns its DTOs, handlers, routes and services.

pub mod auth;
pub mod categories;
pub mod chat_messages;
pub mod groups;
pub mod reports;
pub mod resources;
pub mod reviews;
pub mod search;
pub mod users;
