use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Offsets into the source text. Containment treats `end` as inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, JsonSchema)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// Re-expresses this span relative to `origin`, saturating at zero.
    #[must_use]
    pub fn relative_to(&self, origin: usize) -> Self {
        Self {
            start: self.start.saturating_sub(origin),
            end: self.end.saturating_sub(origin),
        }
    }
}

/// `outer` covers the whole literal, `inner` only its interpolatable body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
pub struct SpanShape {
    pub outer: Span,
    pub inner: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ParsedVar {
    pub exp: String,
    pub span: SpanShape,
}

/// One prompt occurrence from a fresh parse. Carries no identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ParsedPrompt {
    pub path: String,
    pub content: String,
    pub span: SpanShape,
    #[serde(default)]
    pub variables: Vec<ParsedVar>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Cursor {
    pub offset: usize,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub character: usize,
}

impl Cursor {
    #[must_use]
    pub const fn at(offset: usize) -> Self {
        Self {
            offset,
            line: 0,
            character: 0,
        }
    }
}

/// Snapshot of a host document as delivered with every editor event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct EditorFile {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

impl EditorFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_dirty: false,
            language_id: None,
            cursor: None,
        }
    }

    #[must_use]
    pub fn with_cursor(mut self, offset: usize) -> Self {
        self.cursor = Some(Cursor::at(offset));
        self
    }

    #[must_use]
    pub fn meta(&self) -> FileMeta {
        FileMeta {
            path: self.path.clone(),
            is_dirty: self.is_dirty,
            language_id: self.language_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct FileMeta {
    pub path: String,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_id: Option<String>,
}

impl FileMeta {
    /// Metadata for a file known only from the catalogue.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_dirty: false,
            language_id: None,
        }
    }
}
