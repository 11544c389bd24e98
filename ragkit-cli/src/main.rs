//! ragkit CLI - demos for the ragkit library
//!
//! # Commands
//!
//! ```bash
//! # One-shot question to the chat model
//! ragkit ask "What is the capital of India?"
//!
//! # Interactive chat, type `exit` to stop
//! ragkit chat
//!
//! # Answer a question from a YouTube transcript
//! ragkit rag --video Gfr50f6ZBvo "Can you summarize the video"
//!
//! # Chunk a document and show results
//! ragkit chunk --strategy recursive input.txt
//! ```

use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use ragkit_lib::{
    chat::{ChatSession, Message, Turn},
    chunk::{Chunk, ChunkMetadata, Chunker, FixedSizeChunker, RecursiveChunker},
    config::{RagConfig, Settings},
    embed::{Embedder, MiniLmEmbedder},
    generate::{Generator, HuggingFaceChat},
    index::Index,
    ingest::{Loader, PdfLoader, TextLoader, WikipediaRetriever, YouTubeTranscript},
    pipeline::{rag_chain, Stage},
    prompt::PromptAssembler,
    schema::Student,
    store::MemoryStore,
};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragkit")]
#[command(about = "Retrieval-augmented question answering over documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one question to the chat model
    Ask {
        question: String,
    },

    /// Send a system and a user message, then print the conversation
    Messages {
        #[arg(long, default_value = "You are a helpful assistant")]
        system: String,

        #[arg(long, default_value = "Tell me about LangChain")]
        user: String,
    },

    /// Interactive chat on stdin; type `exit` to stop
    Chat {
        #[arg(long, default_value = "You are a helpful AI assistant")]
        system: String,
    },

    /// Load a PDF and show its first page
    LoadPdf {
        path: String,
    },

    /// Load a PDF and split its pages into fixed-size chunks
    Split {
        path: String,

        #[arg(long, default_value = "200")]
        size: usize,

        #[arg(long, default_value = "0")]
        overlap: usize,

        /// Which chunk to print
        #[arg(long, default_value = "1")]
        show: usize,
    },

    /// Fetch Wikipedia pages relevant to a query
    Wiki {
        query: String,

        #[arg(long, default_value = "2")]
        top_k: usize,

        #[arg(long, default_value = "en")]
        lang: String,
    },

    /// Validate a student record given as JSON
    Student {
        #[arg(default_value = r#"{"age": 32, "email": "abc@gmail.com"}"#)]
        json: String,
    },

    /// Answer a question from a video transcript or a text file
    Rag {
        question: String,

        /// YouTube video id
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        video: Option<String>,

        /// Local UTF-8 text file
        #[arg(long)]
        file: Option<String>,

        /// Number of chunks to retrieve
        #[arg(short, long, default_value = "4")]
        k: usize,

        #[arg(long, default_value = "1000")]
        size: usize,

        #[arg(long, default_value = "200")]
        overlap: usize,
    },

    /// Chunk a document using specified strategy
    Chunk {
        /// Input file to chunk
        input: String,

        /// Chunking strategy: "fixed" or "recursive"
        #[arg(short, long, default_value = "recursive")]
        strategy: String,

        /// Maximum chunk size in characters
        #[arg(long, default_value = "1000")]
        size: usize,

        /// Characters shared between consecutive chunks
        #[arg(long, default_value = "200")]
        overlap: usize,
    },

    /// Embed text and show vector info
    Embed {
        /// Text to embed
        text: String,

        /// Embed as a query rather than a document
        #[arg(short, long)]
        query: bool,
    },

    /// Index a file and search it, without generation
    Search {
        /// Input file to index
        input: String,

        /// Query to search for
        query: String,

        /// Number of results to return
        #[arg(short, long, default_value = "3")]
        k: usize,

        /// Chunking strategy
        #[arg(long, default_value = "recursive")]
        strategy: String,
    },
}

fn chunker(strategy: &str, size: usize, overlap: usize) -> Result<Box<dyn Chunker>> {
    Ok(match strategy {
        "fixed" => Box::new(FixedSizeChunker::new(size, overlap)?),
        "recursive" => Box::new(RecursiveChunker::new(size, overlap)?),
        other => bail!("unknown chunking strategy '{other}', expected 'fixed' or 'recursive'"),
    })
}

fn preview(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    let ellipsis = if text.chars().count() > max { "..." } else { "" };
    format!("{head}{ellipsis}")
}

fn print_history(history: &[Message]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(history)?);
    Ok(())
}

fn print_chunks(label: &str, chunks: &[Chunk], strategy: &str) {
    println!("Chunked '{label}' into {} chunks using {strategy} strategy:\n", chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "--- Chunk {} ({} chars, id: {}) ---",
            i + 1,
            chunk.content.chars().count(),
            &chunk.id[..8]
        );
        println!("{}\n", preview(&chunk.content, 200));
    }
}

fn chat_loop<G: Generator>(session: &mut ChatSession<G>) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match session.turn(&line?)? {
            Turn::Reply(reply) => println!("AI: {reply}"),
            Turn::Exit => break,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    run(Cli::parse().command)
}

/// Hosted chat model configured from `.env` and the environment. Only the
/// commands that talk to the model read settings.
fn chat_model() -> Result<HuggingFaceChat> {
    let settings = Settings::from_env()?;
    Ok(HuggingFaceChat::new(&settings)?)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Ask { question } => {
            let mut model = chat_model()?;
            println!("{}", model.generate(&question)?);
        }

        Commands::Messages { system, user } => {
            let mut session = ChatSession::new(chat_model()?, system);
            session.send(&user)?;
            print_history(session.history())?;
        }

        Commands::Chat { system } => {
            let mut session = ChatSession::new(chat_model()?, system);
            chat_loop(&mut session)?;
            print_history(session.history())?;
        }

        Commands::LoadPdf { path } => {
            let docs = PdfLoader::new(&path).load()?;
            println!("{}", docs.len());
            if let Some(first) = docs.first() {
                println!("{}", first.text);
                println!("{}", serde_json::to_string(&first.metadata)?);
            }
        }

        Commands::Split {
            path,
            size,
            overlap,
            show,
        } => {
            let docs = PdfLoader::new(&path).load()?;
            let chunks = FixedSizeChunker::new(size, overlap)?.chunk_documents(&docs);
            let chunk = chunks
                .get(show)
                .ok_or_else(|| anyhow!("only {} chunks, cannot show #{show}", chunks.len()))?;
            println!("{}", chunk.content);
        }

        Commands::Wiki { query, top_k, lang } => {
            let docs = WikipediaRetriever::new()?
                .with_lang(lang)
                .with_top_k_results(top_k)
                .retrieve(&query)?;
            for (i, doc) in docs.iter().enumerate() {
                println!("\n--- Result {} ---", i + 1);
                println!("Content:\n{}...", doc.text);
            }
        }

        Commands::Student { json } => {
            let value: Value = serde_json::from_str(&json)?;
            let student = Student::from_json(&value)?;
            for (field, value) in student.to_map() {
                println!("{field}: {value}");
            }
            println!("{}", student.to_json()?);
        }

        Commands::Rag {
            question,
            video,
            file,
            k,
            size,
            overlap,
        } => {
            let model = chat_model()?;
            let config = RagConfig::builder()
                .chunk_size(size)
                .chunk_overlap(overlap)
                .top_k(k)
                .build()?;

            let docs = match (video, file) {
                (Some(id), _) => YouTubeTranscript::new(id)?.load()?,
                (None, Some(path)) => TextLoader::new(path).load()?,
                (None, None) => bail!("either --video or --file is required"),
            };

            let chunks =
                RecursiveChunker::new(config.chunk_size, config.chunk_overlap)?.chunk_documents(&docs);
            info!(documents = docs.len(), chunks = chunks.len(), "ingested");

            println!("Loading MiniLM model (first run downloads the weights)...");
            let index = Index::build(MiniLmEmbedder::new()?, MemoryStore::new(), &chunks)?;
            let mut chain = rag_chain(
                index,
                PromptAssembler::new()?,
                model,
                config.top_k,
            );
            println!("{}", chain.run(question)?);
        }

        Commands::Chunk {
            input,
            strategy,
            size,
            overlap,
        } => {
            let text = fs::read_to_string(&input)?;
            let chunks = chunker(&strategy, size, overlap)?.chunk(&text, ChunkMetadata::default());
            print_chunks(&input, &chunks, &strategy);
        }

        Commands::Embed { text, query } => {
            println!("Loading MiniLM model (first run downloads the weights)...");
            let mut embedder = MiniLmEmbedder::new()?;

            let embedding = if query {
                println!("Embedding as query: {text}");
                embedder.embed_query(&text)?
            } else {
                println!("Embedding as document: {text}");
                embedder
                    .embed_documents(&[text.as_str()])?
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("embedder returned no vectors"))?
            };

            println!("\nEmbedding stats:");
            println!("  Dimensions: {}", embedding.len());
            println!("  First 5 values: {:?}", &embedding[..embedding.len().min(5)]);
            println!("  Min: {:.4}", embedding.iter().cloned().fold(f32::INFINITY, f32::min));
            println!("  Max: {:.4}", embedding.iter().cloned().fold(f32::NEG_INFINITY, f32::max));
        }

        Commands::Search {
            input,
            query,
            k,
            strategy,
        } => {
            println!("Loading '{input}'...");
            let text = fs::read_to_string(&input)?;
            let chunks = chunker(&strategy, 1000, 200)?.chunk(&text, ChunkMetadata::default());
            println!("Created {} chunks using {strategy} strategy", chunks.len());

            println!("\nLoading MiniLM model (first run downloads the weights)...");
            let mut index = Index::build(MiniLmEmbedder::new()?, MemoryStore::new(), &chunks)?;
            println!("Done! Index contains {} chunks", index.len());

            println!("\nSearching: '{query}' (k={k})");
            let results = index.query(&query, k)?;

            println!("\n=== Results ===\n");
            for (i, result) in results.iter().enumerate() {
                println!("#{} (distance: {:.4})", i + 1, result.distance);
                println!("---");
                println!("{}\n", preview(&result.chunk.content, 300));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ragkit_lib::config::TEMPERATURE_VAR;

    use super::*;

    fn command(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("ragkit").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_offline_commands_ignore_bad_settings() {
        std::env::set_var(TEMPERATURE_VAR, "warm");

        run(command(&["student", r#"{"age": 32, "email": "abc@gmail.com"}"#])).unwrap();

        let err = run(command(&["ask", "hello"])).unwrap_err();
        assert!(err.to_string().contains(TEMPERATURE_VAR), "{err}");
    }
}
