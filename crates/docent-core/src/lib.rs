//! Query routing, grounded answer composition, and the chat session.

pub mod agent;
pub mod bootstrap;
pub mod chatbot;
pub mod composer;
pub mod config;
pub mod error;
pub mod router;
pub mod session;

pub use agent::{AgentMemory, AgentResponse, ToolAgent};
pub use chatbot::{ChatBot, SystemStatus};
pub use composer::{ComposedAnswer, RetrievalComposer, SourceRef};
pub use config::Config;
pub use error::ChatError;
pub use router::{Mode, QueryResponse, QueryRouter, Route, RouteOutcome, classify};
pub use session::{ConversationTurn, Session};
