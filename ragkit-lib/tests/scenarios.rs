//! End-to-end flows with deterministic in-test models.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ragkit_lib::chat::{ChatSession, Message, Role, Turn};
use ragkit_lib::chunk::{Chunker, RecursiveChunker};
use ragkit_lib::config::RagConfig;
use ragkit_lib::document::Document;
use ragkit_lib::embed::{Embedder, Embedding};
use ragkit_lib::generate::Generator;
use ragkit_lib::index::Index;
use ragkit_lib::ingest::{parse_timedtext, transcript_document};
use ragkit_lib::pipeline::{rag_chain, Answer, Stage};
use ragkit_lib::prompt::PromptAssembler;
use ragkit_lib::store::MemoryStore;
use ragkit_lib::{Error, Result};

/// Letter-frequency vectors: texts with the same letters are identical.
struct LetterEmbedder;

impl Embedder for LetterEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed_query(t)).collect()
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        let mut v = vec![0.0; 26];
        for c in text.chars().filter(char::is_ascii_lowercase) {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
        Ok(v)
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model_name(&self) -> &str {
        "letters"
    }
}

/// Replies from a script and records every conversation it was sent.
#[derive(Clone)]
struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String>>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            seen: Arc::default(),
        }
    }

    fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Generator for ScriptedGenerator {
    fn chat(&mut self, messages: &[Message]) -> Result<String> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(script_exhausted()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn script_exhausted() -> Error {
    Error::GenerationProvider {
        provider: "scripted".into(),
        message: "script exhausted".into(),
    }
}

const SENTENCES: [&str; 10] = [
    "Welcome back to the channel everyone.",
    "Today we are looking at how DeepMind trained an agent.",
    "The agent controls plasma inside a tokamak.",
    "Magnetic coils shape the plasma many times per second.",
    "Reinforcement learning was done in a simulator first.",
    "The policy then ran on the real machine.",
    "It held several plasma shapes stable.",
    "Engineers were surprised by how quickly it learned.",
    "Fusion energy still has a long way to go.",
    "Thanks for watching and see you next time.",
];

#[test]
fn ten_sentence_transcript_is_one_chunk() {
    let xml: String = SENTENCES
        .iter()
        .enumerate()
        .map(|(i, s)| format!(r#"<text start="{i}.0" dur="1.0">{s}</text>"#))
        .collect();
    let snippets = parse_timedtext(&format!("<transcript>{xml}</transcript>"));
    assert_eq!(snippets.len(), 10);

    let doc = transcript_document("Gfr50f6ZBvo", "en", &snippets);
    assert_eq!(doc.text, SENTENCES.join(" "));

    let config = RagConfig::default();
    let chunks = RecursiveChunker::new(config.chunk_size, config.chunk_overlap)
        .unwrap()
        .chunk_document(&doc);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, doc.text);
    assert_eq!(chunks[0].metadata.source_id.as_deref(), Some("Gfr50f6ZBvo"));
}

fn topics() -> Vec<String> {
    [
        "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    ]
    .iter()
    .map(|w| format!("{w} {w} {w} is the topic here"))
    .collect()
}

#[test]
fn top_k_retrieval_is_nearest_first() {
    let doc = Document::new("synthetic", topics().join("\n\n"));
    let chunks = RecursiveChunker::new(50, 0).unwrap().chunk_document(&doc);
    assert_eq!(chunks.len(), 10);

    let mut index = Index::build(LetterEmbedder, MemoryStore::new(), &chunks).unwrap();
    let query = topics()[6].clone();
    let retrieved = index.query(&query, 4).unwrap();

    assert_eq!(retrieved.len(), 4);
    assert_eq!(retrieved.results[0].chunk.content, query);
    assert_eq!(retrieved.results[0].distance, 0.0);
    for pair in retrieved.results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn k_larger_than_index_returns_everything() {
    let doc = Document::new("synthetic", topics()[..3].join("\n\n"));
    let chunks = RecursiveChunker::new(50, 0).unwrap().chunk_document(&doc);

    let mut index = Index::build(LetterEmbedder, MemoryStore::new(), &chunks).unwrap();
    assert_eq!(index.query("golf", 4).unwrap().len(), 3);
}

#[test]
fn rag_chain_sends_grounded_prompt() {
    let doc = Document::new("synthetic", topics().join("\n\n"));
    let chunks = RecursiveChunker::new(50, 0).unwrap().chunk_document(&doc);
    let index = Index::build(LetterEmbedder, MemoryStore::new(), &chunks).unwrap();

    let model = ScriptedGenerator::new(vec![Ok("  Echo is the topic.\n".into())]);
    let mut chain = rag_chain(index, PromptAssembler::new().unwrap(), model.clone(), 2);

    let question = topics()[4].clone();
    let answer = chain.run(question.clone()).unwrap();
    assert_eq!(answer, Answer("Echo is the topic.".into()));

    let seen = model.seen();
    assert_eq!(seen.len(), 1);
    let prompt = &seen[0][0].content;
    assert_eq!(seen[0][0].role, Role::User);
    let (context, asked) = prompt.split_once("Question: ").unwrap();
    assert!(context.contains(&question));
    assert_eq!(asked, question);
}

#[test]
fn chat_history_grows_by_two_per_turn() {
    let model = ScriptedGenerator::new(vec![Ok("Hi there!".into()), Ok("New Delhi.".into())]);
    let mut session = ChatSession::new(model.clone(), "You are a helpful AI assistant");

    session.send("hello").unwrap();
    assert_eq!(session.history().len(), 3);
    let roles: Vec<Role> = session.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

    assert_eq!(
        session.turn("capital of India?").unwrap(),
        Turn::Reply("New Delhi.".into())
    );
    assert_eq!(session.history().len(), 5);

    // the second call saw the whole conversation so far
    assert_eq!(model.seen()[1].len(), 4);
}

#[test]
fn exit_keyword_ends_without_recording() {
    let model = ScriptedGenerator::new(vec![]);
    let mut session = ChatSession::new(model.clone(), "system");

    assert_eq!(session.turn("exit").unwrap(), Turn::Exit);
    assert_eq!(session.history().len(), 1);
    assert!(model.seen().is_empty());
}

#[test]
fn failed_generation_leaves_history_unchanged() {
    let model = ScriptedGenerator::new(vec![Err(Error::RateLimited {
        provider: "scripted".into(),
        retry_after_secs: Some(3),
    })]);
    let mut session = ChatSession::new(model, "system");

    let err = session.send("hello").unwrap_err();
    assert!(matches!(err, Error::RateLimited { retry_after_secs: Some(3), .. }));
    assert_eq!(session.history(), &[Message::system("system")]);
}
