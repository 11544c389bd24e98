use std::sync::LazyLock;

use regex::Regex;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::document::Document;
use crate::http;
use crate::ingest::Loader;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

static SNIPPET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text start="([0-9.]+)"(?: dur="([0-9.]+)")?[^>]*>(.*?)</text>"#)
        .expect("snippet pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+|[a-z]+);").expect("entity pattern is valid")
});

static TRACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<track\b([^>]*)>").expect("track pattern is valid"));

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([a-z_]+)="([^"]*)""#).expect("attribute pattern is valid"));

/// `kind` of an auto-generated (speech recognition) caption track
const GENERATED_KIND: &str = "asr";

/// One caption line
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSnippet {
    pub text: String,
    /// Seconds from the start of the video
    pub start: f64,
    /// Seconds the line stays on screen
    pub duration: f64,
}

/// One caption track a video advertises, or one we ask for blindly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub lang_code: String,
    /// Track name, empty for the unnamed default track
    pub name: String,
    /// `Some("asr")` for auto-generated captions
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn manual(lang_code: &str) -> Self {
        Self {
            lang_code: lang_code.to_string(),
            name: String::new(),
            kind: None,
        }
    }

    fn generated(lang_code: &str) -> Self {
        Self {
            kind: Some(GENERATED_KIND.to_string()),
            ..Self::manual(lang_code)
        }
    }

    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some(GENERATED_KIND)
    }
}

/// Caption track of a YouTube video, flattened into one document.
///
/// Languages are tried in order. For each one a manually written track is
/// preferred over an auto-generated one. The advertised track list is
/// consulted first so named tracks are found. A video with no captions in
/// any of the languages is [`Error::SourceUnavailable`].
pub struct YouTubeTranscript {
    client: Client,
    base_url: String,
    video_id: String,
    languages: Vec<String>,
}

impl YouTubeTranscript {
    /// Fetch English captions for `video_id` (the id only, not the full URL).
    pub fn new(video_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http::client()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            video_id: video_id.into(),
            languages: vec!["en".to_string()],
        })
    }

    /// Preferred caption languages, most preferred first.
    #[must_use]
    pub fn with_languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Fetch the caption snippets of the first non-empty track, in
    /// preference order.
    pub fn fetch(&self) -> Result<(CaptionTrack, Vec<TranscriptSnippet>)> {
        let listed = match self.get(&[("type", "list"), ("v", self.video_id.as_str())])? {
            Some(body) => parse_track_list(&body),
            None => Vec::new(),
        };
        debug!(video = %self.video_id, tracks = listed.len(), "listed caption tracks");

        for track in caption_requests(&listed, &self.languages) {
            let body = {
                let mut query = vec![("v", self.video_id.as_str()), ("lang", track.lang_code.as_str())];
                if !track.name.is_empty() {
                    query.push(("name", track.name.as_str()));
                }
                if let Some(kind) = &track.kind {
                    query.push(("kind", kind.as_str()));
                }
                self.get(&query)?
            };
            let Some(body) = body else {
                continue;
            };
            let snippets = parse_timedtext(&body);
            if !snippets.is_empty() {
                return Ok((track, snippets));
            }
            debug!(video = %self.video_id, lang = %track.lang_code, kind = ?track.kind, "empty caption track");
        }

        Err(Error::source_unavailable(
            &self.video_id,
            format!("no captions available in {}", self.languages.join(", ")),
        ))
    }

    /// GET `/api/timedtext`. A non-success status is `None`, an unreachable
    /// host is an error.
    fn get(&self, query: &[(&str, &str)]) -> Result<Option<String>> {
        let url = format!("{}/api/timedtext", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| Error::source_unavailable(&self.video_id, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            debug!(video = %self.video_id, status = %response.status(), "timedtext request refused");
            return Ok(None);
        }
        response
            .text()
            .map(Some)
            .map_err(|e| Error::source_unavailable(&self.video_id, e.to_string()))
    }
}

impl Loader for YouTubeTranscript {
    fn load(&self) -> Result<Vec<Document>> {
        let (track, snippets) = self.fetch()?;
        info!(
            video = %self.video_id,
            lang = %track.lang_code,
            generated = track.is_generated(),
            snippets = snippets.len(),
            "fetched transcript"
        );
        let doc = transcript_document(&self.video_id, &track.lang_code, &snippets)
            .with_metadata("generated", track.is_generated().to_string());
        Ok(vec![doc])
    }
}

/// Join snippets into one document, separated by single spaces.
pub fn transcript_document(video_id: &str, lang: &str, snippets: &[TranscriptSnippet]) -> Document {
    let text = snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Document::new(video_id, text)
        .with_metadata("source", video_id)
        .with_metadata("language", lang)
}

/// Parse a `type=list` response into the tracks it advertises.
pub fn parse_track_list(xml: &str) -> Vec<CaptionTrack> {
    TRACK
        .captures_iter(xml)
        .filter_map(|cap| {
            let mut track = CaptionTrack::manual("");
            for attr in ATTRIBUTE.captures_iter(&cap[1]) {
                let value = unescape(&attr[2]);
                match &attr[1] {
                    "lang_code" => track.lang_code = value,
                    "name" => track.name = value,
                    "kind" if !value.is_empty() => track.kind = Some(value),
                    _ => {}
                }
            }
            (!track.lang_code.is_empty()).then_some(track)
        })
        .collect()
}

/// Tracks to request, most preferred first.
///
/// Per language: the listed manual tracks (or the unnamed default when none
/// is listed), then the listed generated track (or a blind `kind=asr`
/// request). Duplicates are dropped.
pub fn caption_requests(listed: &[CaptionTrack], languages: &[String]) -> Vec<CaptionTrack> {
    let mut requests: Vec<CaptionTrack> = Vec::new();
    for lang in languages {
        let in_lang = || listed.iter().filter(move |t| &t.lang_code == lang);

        let manual: Vec<CaptionTrack> = in_lang().filter(|t| !t.is_generated()).cloned().collect();
        let generated: Vec<CaptionTrack> = in_lang().filter(|t| t.is_generated()).cloned().collect();

        let candidates = [
            if manual.is_empty() { vec![CaptionTrack::manual(lang)] } else { manual },
            if generated.is_empty() { vec![CaptionTrack::generated(lang)] } else { generated },
        ];
        for track in candidates.into_iter().flatten() {
            if !requests.contains(&track) {
                requests.push(track);
            }
        }
    }
    requests
}

/// Parse a `timedtext` XML caption track. Entities are decoded and line
/// breaks inside a snippet become spaces; empty snippets are dropped.
pub fn parse_timedtext(xml: &str) -> Vec<TranscriptSnippet> {
    SNIPPET
        .captures_iter(xml)
        .filter_map(|cap| {
            let start = cap[1].parse().ok()?;
            let duration = cap.get(2).and_then(|d| d.as_str().parse().ok()).unwrap_or(0.0);
            // captions are often double-escaped (`&amp;#39;`)
            let text = unescape(&unescape(&cap[3]));
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSnippet {
                text,
                start,
                duration,
            })
        })
        .collect()
}

fn unescape(s: &str) -> String {
    ENTITY
        .replace_all(s, |cap: &regex::Captures| {
            let entity = &cap[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(str::parse))
                    .and_then(|n| n.ok())
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| cap[0].to_string(), String::from)
        })
        .into_owned()
}
