//! Text generation with hosted chat models
//!
//! # Usage
//!
//! ```ignore
//! use ragkit_lib::generate::{Generator, HuggingFaceChat};
//!
//! let mut model = HuggingFaceChat::new(&settings)?;
//! let answer = model.generate("What is the capital of India?")?;
//! ```

use crate::chat::Message;
use crate::Result;

/// Trait for chat/completion models
pub trait Generator: Send + Sync {
    /// Send an ordered, role-tagged conversation and return the reply text.
    fn chat(&mut self, messages: &[Message]) -> Result<String>;

    /// Send a single prompt as a user message.
    fn generate(&mut self, prompt: &str) -> Result<String> {
        self.chat(&[Message::user(prompt)])
    }

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod huggingface;

pub use huggingface::*;
