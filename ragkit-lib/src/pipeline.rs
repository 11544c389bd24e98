//! Typed stage composition
//!
//! A pipeline is a chain of [`Stage`]s joined with [`Stage::then`]. Each
//! stage's output type is the next stage's input type, so a mis-ordered
//! chain does not compile.
//!
//! ```text
//! question ─ Retrieve ─> RetrievedSet ─ PromptAssembler ─> Prompt
//!          ─ Generate ─> String ─ ParseAnswer ─> Answer
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ragkit_lib::pipeline::{rag_chain, Stage};
//!
//! let mut chain = rag_chain(index, PromptAssembler::new()?, model, 4);
//! let answer = chain.run("Can you summarize the video".to_string())?;
//! ```

use std::fmt;

use tracing::info;

use crate::embed::Embedder;
use crate::generate::Generator;
use crate::index::{Index, RetrievedSet};
use crate::prompt::{Prompt, PromptAssembler};
use crate::store::VectorStore;
use crate::Result;

/// One step of a pipeline.
pub trait Stage<I> {
    type Output;

    fn run(&mut self, input: I) -> Result<Self::Output>;

    /// Feed this stage's output into `next`.
    fn then<N>(self, next: N) -> Then<Self, N>
    where
        Self: Sized,
        N: Stage<Self::Output>,
    {
        Then { first: self, second: next }
    }
}

/// Two stages run back to back.
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<I, A, B> Stage<I> for Then<A, B>
where
    A: Stage<I>,
    B: Stage<A::Output>,
{
    type Output = B::Output;

    fn run(&mut self, input: I) -> Result<Self::Output> {
        let mid = self.first.run(input)?;
        self.second.run(mid)
    }
}

/// A closure used as a stage.
pub struct FnStage<F>(pub F);

impl<I, O, F> Stage<I> for FnStage<F>
where
    F: FnMut(I) -> Result<O>,
{
    type Output = O;

    fn run(&mut self, input: I) -> Result<O> {
        (self.0)(input)
    }
}

/// Question to retrieved context.
pub struct Retrieve<E: Embedder, S: VectorStore> {
    index: Index<E, S>,
    k: usize,
}

impl<E: Embedder, S: VectorStore> Retrieve<E, S> {
    pub fn new(index: Index<E, S>, k: usize) -> Self {
        Self { index, k }
    }

    pub fn index(&self) -> &Index<E, S> {
        &self.index
    }
}

impl<E: Embedder, S: VectorStore> Stage<String> for Retrieve<E, S> {
    type Output = RetrievedSet;

    fn run(&mut self, question: String) -> Result<RetrievedSet> {
        let retrieved = self.index.query(&question, self.k)?;
        info!(k = self.k, retrieved = retrieved.len(), "retrieve");
        Ok(retrieved)
    }
}

impl Stage<RetrievedSet> for PromptAssembler {
    type Output = Prompt;

    fn run(&mut self, retrieved: RetrievedSet) -> Result<Prompt> {
        let prompt = self.assemble(&retrieved, &retrieved.query);
        info!(prompt_chars = prompt.as_str().len(), "assemble");
        Ok(prompt)
    }
}

/// Prompt to raw model output.
pub struct Generate<G: Generator>(pub G);

impl<G: Generator> Stage<Prompt> for Generate<G> {
    type Output = String;

    fn run(&mut self, prompt: Prompt) -> Result<String> {
        let raw = self.0.generate(prompt.as_str())?;
        info!(model = self.0.model_name(), "generate");
        Ok(raw)
    }
}

/// Final text produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(pub String);

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw model output to [`Answer`], trimming surrounding whitespace.
pub struct ParseAnswer;

impl Stage<String> for ParseAnswer {
    type Output = Answer;

    fn run(&mut self, raw: String) -> Result<Answer> {
        Ok(Answer(raw.trim().to_string()))
    }
}

/// The full retrieval-augmented answering chain.
pub type RagChain<E, S, G> = Then<Then<Then<Retrieve<E, S>, PromptAssembler>, Generate<G>>, ParseAnswer>;

/// Build retrieve, assemble, generate and parse into one chain.
pub fn rag_chain<E, S, G>(
    index: Index<E, S>,
    assembler: PromptAssembler,
    generator: G,
    k: usize,
) -> RagChain<E, S, G>
where
    E: Embedder,
    S: VectorStore,
    G: Generator,
{
    Retrieve::new(index, k)
        .then(assembler)
        .then(Generate(generator))
        .then(ParseAnswer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::chunk::{Chunker, ChunkMetadata, FixedSizeChunker};
    use crate::embed::Embedding;
    use crate::store::MemoryStore;
    use crate::Error;

    struct VowelEmbedder;

    impl Embedder for VowelEmbedder {
        fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
            texts.iter().map(|t| self.embed_query(t)).collect()
        }

        fn embed_query(&mut self, text: &str) -> Result<Embedding> {
            Ok("aeiou"
                .chars()
                .map(|v| text.chars().filter(|c| *c == v).count() as f32)
                .collect())
        }

        fn dimension(&self) -> usize {
            5
        }

        fn model_name(&self) -> &str {
            "vowels"
        }
    }

    /// Echoes the prompt it was given, padded with whitespace.
    struct EchoGenerator;

    impl Generator for EchoGenerator {
        fn chat(&mut self, messages: &[Message]) -> Result<String> {
            Ok(format!("  {}\n", messages[messages.len() - 1].content))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn index() -> Index<VowelEmbedder, MemoryStore> {
        let chunker = FixedSizeChunker::new(5, 0).unwrap();
        let chunks = chunker.chunk("aaaaaeeeeeiiiiiooooouuuuu", ChunkMetadata::default());
        Index::build(VowelEmbedder, MemoryStore::new(), &chunks).unwrap()
    }

    #[test]
    fn test_rag_chain_end_to_end() {
        let assembler = PromptAssembler::with_template("{context}|{question}").unwrap();
        let mut chain = rag_chain(index(), assembler, EchoGenerator, 1);

        let answer = chain.run("ooo".to_string()).unwrap();
        assert_eq!(answer, Answer("ooooo|ooo".into()));
    }

    #[test]
    fn test_then_with_closures() {
        let mut chain = FnStage(|s: String| -> Result<usize> { Ok(s.len()) })
            .then(FnStage(|n: usize| -> Result<usize> { Ok(n * 2) }))
            .then(FnStage(|n: usize| -> Result<String> { Ok(format!("{n}")) }));
        assert_eq!(chain.run("abcd".to_string()).unwrap(), "8");
    }

    #[test]
    fn test_error_stops_chain() {
        let mut reached = false;
        {
            let mut chain = FnStage(|_: ()| -> Result<u8> { Err(Error::InvalidInput("stop".into())) })
                .then(FnStage(|n: u8| -> Result<u8> {
                    reached = true;
                    Ok(n)
                }));
            assert!(chain.run(()).is_err());
        }
        assert!(!reached);
    }

    #[test]
    fn test_parse_answer_trims() {
        let answer = ParseAnswer.run("\n  I don't know.  \n".to_string()).unwrap();
        assert_eq!(answer.to_string(), "I don't know.");
    }
}
