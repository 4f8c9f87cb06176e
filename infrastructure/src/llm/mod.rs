//! LLM-backed collaborators: content generator and the similarity /
//! scoring oracles.
//!
//! All three share one thin [`ChatClient`] over an OpenAI-compatible
//! chat-completions endpoint. The oracles parse a single numeric score out
//! of the reply; anything unparsable surfaces as an oracle error so the
//! consuming engine applies its own fallback.

mod chat;
mod generator;
mod oracles;

pub use chat::{ChatClient, ChatError};
pub use generator::LlmContentGenerator;
pub use oracles::{LlmScoringOracle, LlmSimilarityOracle};
