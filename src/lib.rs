//! Terminal chat client for OpenAI-compatible chat-completion endpoints.
//!
//! A credential gate keeps the conversation view closed until an API key is
//! stored; after that every submit appends a user turn, sends the history, and
//! appends exactly one assistant turn (the reply, or an error rendered as a
//! reply) once the request settles.

pub mod app;
pub mod chat;
pub mod completions;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod credential;
pub mod dispatcher;
pub mod store;
pub mod ui;
pub mod ui_components;

pub use completions::{ClientError, CompletionResponse, CompletionsClient};
pub use config::Config;
pub use conversation::{Conversation, Role, Turn};
pub use credential::{Credential, CredentialGate};
pub use dispatcher::{reply_text, ChatSession, DispatchState};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
