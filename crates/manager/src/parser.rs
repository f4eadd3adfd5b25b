use log::{debug, warn};
use lru::LruCache;
use playground_protocol::{EditorFile, ParsedPrompt};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Extracts prompt occurrences from source text. Implemented outside this workspace.
pub trait PromptParser: Send + Sync {
    fn parse(&self, content: &str, path: &str) -> Result<Vec<ParsedPrompt>, ParseError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSource {
    /// Fresh parse, or the cached result for identical content.
    Parsed,
    /// Parse failed; the last good result for this path is served instead.
    Cached { error: String },
    /// Parse failed and nothing was cached for this path.
    Fallback { error: String },
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub prompts: Arc<[ParsedPrompt]>,
    pub source: ParseSource,
}

impl ParseOutcome {
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.source {
            ParseSource::Parsed => None,
            ParseSource::Cached { error } | ParseSource::Fallback { error } => Some(error),
        }
    }

    /// Whether the prompts describe the file well enough to reconcile against.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self.source, ParseSource::Fallback { .. })
    }
}

struct CachedParse {
    content: String,
    prompts: Arc<[ParsedPrompt]>,
}

/// Last good parse per path, bounded by LRU eviction.
pub struct ParseCache {
    entries: LruCache<String, CachedParse>,
}

impl ParseCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parse(&mut self, parser: &dyn PromptParser, file: &EditorFile) -> ParseOutcome {
        if let Some(cached) = self.entries.get(file.path.as_str()) {
            if cached.content == file.content {
                debug!("Using cached prompts for {}", file.path);
                return ParseOutcome {
                    prompts: Arc::clone(&cached.prompts),
                    source: ParseSource::Parsed,
                };
            }
        }

        match parser.parse(&file.content, &file.path) {
            Ok(prompts) => {
                debug!("Parsed {} prompts in {}", prompts.len(), file.path);
                let prompts: Arc<[ParsedPrompt]> = prompts.into();
                self.entries.put(
                    file.path.clone(),
                    CachedParse {
                        content: file.content.clone(),
                        prompts: Arc::clone(&prompts),
                    },
                );
                ParseOutcome {
                    prompts,
                    source: ParseSource::Parsed,
                }
            }
            Err(err) => match self.entries.get(file.path.as_str()) {
                Some(cached) => {
                    debug!(
                        "Using cached prompts for {} due to parse error: {err}",
                        file.path
                    );
                    ParseOutcome {
                        prompts: Arc::clone(&cached.prompts),
                        source: ParseSource::Cached { error: err.0 },
                    }
                }
                None => {
                    warn!("Failed to parse prompts in {}: {err}", file.path);
                    ParseOutcome {
                        prompts: Arc::from(Vec::new()),
                        source: ParseSource::Fallback { error: err.0 },
                    }
                }
            },
        }
    }
}
