mod group_handler;

pub use group_handler::*;
