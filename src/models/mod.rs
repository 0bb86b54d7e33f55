pub mod chat;
pub mod voice;
