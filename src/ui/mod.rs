pub mod canvas;
pub mod chat;
