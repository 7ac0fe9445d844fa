mod chat_message_service;

pub use chat_message_service::ChatMessageService;
