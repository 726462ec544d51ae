pub mod client;
pub mod config;
pub mod models;
pub mod renderer;
pub mod session;
pub mod ui;

#[cfg(test)]
mod testing;

pub use client::{ChatClient, ChatTransport, HttpTransport};
pub use config::Config;
pub use models::{ChatMessage, ChatRequest, ChatResponse, Choice, Error, Role, Turn};
pub use session::{ChatSession, ChatView};
