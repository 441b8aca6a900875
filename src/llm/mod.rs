//! LLM-facing components: chat wire types and the OpenAI-compatible upstream client.

pub mod error;
pub mod openai_compat;
pub mod types;

pub use error::{UpstreamError, UpstreamResult};
pub use openai_compat::{CompletionClient, OpenAiCompatClient};
pub use types::{ChatMessage, CompletionRequest, Role, SamplingConfig};
