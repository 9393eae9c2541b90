//! AI generation client.

mod openai;

pub use openai::{OpenAiConfig, OpenAiGenerator};
