mod account_handler;
mod user_handler;

pub use account_handler::*;
pub use user_handler::*;
