mod chat_message_dto;

pub use chat_message_dto::*;
