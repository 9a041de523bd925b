//! Chat assistant for the tour catalog.
//!
//! A message is answered in one of two modes:
//!
//! - **rules**: `conversation` extracts country, category and budget, `search`
//!   filters the catalog, and `render` turns the result into reply text.
//! - **llm**: when a completion API is configured, `runtime` hands the message
//!   to the model together with the tools in `tools`. Any failure on that path
//!   drops back to the rules mode for the same request.
//!
//! Either way the exchange is recorded in the chat session store and the
//! session's merged preferences are returned with the reply.

pub mod conversation;
pub mod features;
pub mod llm;
pub mod render;
pub mod runtime;
pub mod search;
pub mod tools;

pub use llm::{LlmClient, LlmError, OpenAiCompatibleClient};
pub use runtime::{AgentError, AgentRuntime, ChatContext, ChatReply, ReplyMode};
