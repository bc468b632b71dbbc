// LLM abstraction layer

pub mod provider;
pub mod ollama;
pub mod openai;

pub use provider::*;
