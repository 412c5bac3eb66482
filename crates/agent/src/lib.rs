//! Chat turn orchestration for the Dappazon shopping assistant.
//!
//! A turn flows through:
//! 1. **Prompt** (`prompt`) - live catalog prompt with the action grammar, or
//!    the fixed fallback when the ledger cannot be read
//! 2. **Cascade** (`cascade`) - ordered models, advancing only on rate limits
//! 3. **Extraction** (`actions`) - `[ACTION:KIND:PAYLOAD]` tags out of the reply
//! 4. **Augmentation** (`augment`) - web search plus a same-model follow-up
//!
//! `AgentRuntime` (see `runtime`) wires these together. Every external
//! collaborator is a trait object handed in by the caller.

pub mod actions;
pub mod augment;
pub mod cascade;
pub mod conversation;
pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod search;

pub use conversation::ChatRequest;
pub use llm::{ChatCompletionsClient, CompletionError, LlmClient, Sampling};
pub use prompt::{PromptComposer, PromptSource, SystemPrompt};
pub use runtime::{AgentRuntime, RuntimeSettings};
pub use search::{SearchError, SerpApiClient, WebSearch};
