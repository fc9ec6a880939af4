//! AI tutor chat: prompt assembly, OpenAI-compatible streaming, and the
//! relay that forwards generated fragments to a client connection.

pub mod config;
pub mod embeddings;
pub mod prompt;
pub mod providers;
pub mod relay;
pub mod types;

pub use config::LLMConfig;
pub use relay::{ByteSink, ChannelSink, RelayOptions, RelayOutcome, RelaySession, RelayState};
pub use types::*;
