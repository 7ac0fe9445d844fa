mod chat_message_handler;

pub use chat_message_handler::*;
