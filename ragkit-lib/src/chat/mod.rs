//! Role-tagged messages and multi-turn chat sessions

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generate::Generator;
use crate::Result;

/// Keyword that ends an interactive chat loop.
pub const EXIT_KEYWORD: &str = "exit";

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Outcome of one interactive turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// The model replied with this text
    Reply(String),
    /// The user typed the exit keyword; history is unchanged
    Exit,
}

/// A chat with accumulated history.
///
/// Every call sends the full history. History is never truncated.
pub struct ChatSession<G: Generator> {
    generator: G,
    history: Vec<Message>,
}

impl<G: Generator> ChatSession<G> {
    /// Start a session whose history begins with one system message.
    pub fn new(generator: G, system_prompt: impl Into<String>) -> Self {
        Self::with_history(generator, vec![Message::system(system_prompt)])
    }

    /// Start a session from existing messages.
    pub fn with_history(generator: G, history: Vec<Message>) -> Self {
        Self { generator, history }
    }

    /// Append `input` as a user message, generate, append the reply.
    ///
    /// On failure the user message is removed again, leaving history as it
    /// was before the call.
    pub fn send(&mut self, input: &str) -> Result<&Message> {
        self.history.push(Message::user(input));

        let reply = match self.generator.chat(&self.history) {
            Ok(reply) => reply,
            Err(e) => {
                self.history.pop();
                return Err(e);
            }
        };
        debug!(history = self.history.len() + 1, "chat turn complete");

        self.history.push(Message::assistant(reply));
        Ok(&self.history[self.history.len() - 1])
    }

    /// One interactive turn: [`EXIT_KEYWORD`] ends the chat without being
    /// recorded, anything else is sent.
    pub fn turn(&mut self, input: &str) -> Result<Turn> {
        if input.trim() == EXIT_KEYWORD {
            return Ok(Turn::Exit);
        }
        let reply = self.send(input)?;
        Ok(Turn::Reply(reply.content.clone()))
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Message> {
        self.history
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    /// Replies with how many messages it was sent, or fails when told to.
    struct CountingGenerator {
        fail: bool,
        seen: Vec<usize>,
    }

    impl Generator for CountingGenerator {
        fn chat(&mut self, messages: &[Message]) -> Result<String> {
            if self.fail {
                return Err(Error::RateLimited {
                    provider: "test".into(),
                    retry_after_secs: None,
                });
            }
            self.seen.push(messages.len());
            Ok(format!("saw {}", messages.len()))
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn session(fail: bool) -> ChatSession<CountingGenerator> {
        ChatSession::new(
            CountingGenerator { fail, seen: Vec::new() },
            "You are a helpful AI assistant",
        )
    }

    #[test]
    fn test_first_turn_history_is_three() {
        let mut chat = session(false);
        let reply = chat.send("hello").unwrap();
        assert_eq!(reply.role, Role::Assistant);

        let history = chat.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], Message::system("You are a helpful AI assistant"));
        assert_eq!(history[1], Message::user("hello"));
        assert_eq!(history[2], Message::assistant("saw 2"));
    }

    #[test]
    fn test_full_history_sent_each_turn() {
        let mut chat = session(false);
        for input in ["one", "two", "three"] {
            chat.send(input).unwrap();
        }
        assert_eq!(chat.generator().seen, vec![2, 4, 6]);
        assert_eq!(chat.history().len(), 1 + 2 * 3);
    }

    #[test]
    fn test_exit_leaves_history_alone() {
        let mut chat = session(false);
        assert_eq!(chat.turn("hi").unwrap(), Turn::Reply("saw 2".into()));
        assert_eq!(chat.turn("exit").unwrap(), Turn::Exit);
        assert_eq!(chat.history().len(), 3);
    }

    #[test]
    fn test_failure_rolls_back_user_message() {
        let mut chat = session(true);
        let err = chat.send("hello").unwrap_err();
        assert!(matches!(err, Error::RateLimited { .. }));
        assert_eq!(chat.history().len(), 1);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
