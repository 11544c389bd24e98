//! Prompt templates and RAG prompt assembly
//!
//! Templates use `{name}` placeholders, with `{{` and `}}` for literal braces.
//! A template is parsed once, when it is constructed, so malformed templates
//! fail at startup rather than mid-run.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::index::RetrievedSet;
use crate::{Error, Result};

/// Template used for retrieval-augmented answers.
pub const RAG_TEMPLATE: &str = "You are a helpful assistant.
Answer ONLY from the provided transcript context.
If the context is insufficient, just say you don't know.

{context}

Question: {question}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A parsed prompt template with declared input variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Parse `template` and check that its placeholders are exactly
    /// `input_variables`.
    pub fn new(template: &str, input_variables: &[&str]) -> Result<Self> {
        let segments = parse(template)?;

        let used: BTreeSet<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Var(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect();
        let declared: BTreeSet<&str> = input_variables.iter().copied().collect();

        if let Some(name) = used.difference(&declared).next() {
            return Err(Error::Template(format!(
                "placeholder {{{name}}} is not a declared input variable"
            )));
        }
        if let Some(name) = declared.difference(&used).next() {
            return Err(Error::Template(format!(
                "input variable '{name}' does not appear in the template"
            )));
        }

        Ok(Self {
            segments,
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Substitute every placeholder.
    ///
    /// # Errors
    ///
    /// [`Error::Template`] if a declared variable has no value.
    pub fn format(&self, values: &HashMap<&str, &str>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = values.get(name.as_str()).ok_or_else(|| {
                        Error::Template(format!("missing value for '{name}'"))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn parse(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) if c == '_' || c.is_alphanumeric() => name.push(c),
                        Some(c) => {
                            return Err(Error::Template(format!(
                                "invalid character {c:?} in placeholder"
                            )))
                        }
                        None => return Err(Error::Template("unclosed '{'".into())),
                    }
                }
                if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(Error::Template(format!("invalid placeholder name '{name}'")));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var(name));
            }
            '}' => return Err(Error::Template("single '}' encountered".into())),
            c => text.push(c),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// A fully formatted prompt, ready for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join retrieved chunk contents with a blank line, nearest first.
pub fn format_docs(retrieved: &RetrievedSet) -> String {
    retrieved
        .chunks()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the RAG prompt from retrieved context and a question.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: PromptTemplate,
}

impl PromptAssembler {
    /// Assembler using [`RAG_TEMPLATE`].
    pub fn new() -> Result<Self> {
        Self::with_template(RAG_TEMPLATE)
    }

    /// Assembler using a custom template over `{context}` and `{question}`.
    pub fn with_template(template: &str) -> Result<Self> {
        Ok(Self {
            template: PromptTemplate::new(template, &["context", "question"])?,
        })
    }

    /// Fill the template. Pure: identical inputs give identical prompts.
    pub fn assemble(&self, retrieved: &RetrievedSet, question: &str) -> Prompt {
        let context = format_docs(retrieved);
        let values = HashMap::from([("context", context.as_str()), ("question", question)]);

        // both variables are checked at construction
        let text = self
            .template
            .format(&values)
            .unwrap_or_else(|_| unreachable!("context and question are always supplied"));
        Prompt(text)
    }
}
