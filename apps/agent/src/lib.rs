//! Resume-review agent core.
//!
//! A two-phase, tool-augmented conversation with a chat-completion endpoint:
//! a planning call proposes analysis tools, the orchestrator executes them
//! deterministically (force-running the four mandatory ones), and a final
//! call synthesizes a verdict that is normalized into a fully-populated
//! [`FinalVerdict`] no matter how malformed the model output is.
//!
//! The crate is invoked as a library by an API/UI layer; it carries no HTTP
//! surface, persistence, or resume parsing of its own.

pub mod agent;
pub mod config;
pub mod llm_client;
pub mod sanitize;
pub mod tools;

pub use agent::verdict::{FinalVerdict, RiskLevel};
pub use agent::{run_agent, AgentReport, AgentRequest};
pub use config::AgentConfig;
pub use llm_client::{ChatError, ChatMessage, ChatTransport, OllamaClient};
