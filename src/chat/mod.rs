pub mod classify;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod engine;
pub mod events;
pub mod feedback;
pub mod session;
pub mod state;
pub mod typing;

pub use classify::{classify, Relevance};
pub use client::{ChatClient, Command, Renderer};
pub use config::{ChatConfig, ConfigError};
pub use connection::ConnectionManager;
pub use context::{ContextTracker, ConversationContext, HistoryRequest};
pub use engine::ChatEngine;
pub use events::{InboundEvent, OutboundFrame, TypingScope, ViewEvent};
pub use feedback::Acknowledgment;
pub use session::Session;
pub use state::Directory;
pub use typing::TypingCoordinator;
