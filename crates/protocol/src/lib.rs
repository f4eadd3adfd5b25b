//! # Playground Protocol
//!
//! Data shared between the reconciliation core, the orchestrator and the host:
//! the persisted catalogue ([`PlaygroundMap`]), the derived view ([`PlaygroundState`]),
//! parser output ([`ParsedPrompt`]) and the inbound/outbound message shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod editor;
pub mod message;

pub use editor::{Cursor, EditorFile, FileMeta, ParsedPrompt, ParsedVar, Span, SpanShape};
pub use message::{ClientMessage, EditorEvent, RevealTarget, ServerMessage};

pub const PLAYGROUND_MAP_SCHEMA_VERSION: u32 = 1;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

string_id!(
    /// Stable identity of a file record; survives renames resolved by content.
    FileId
);
string_id!(
    /// Stable identity of a prompt record; survives edits judged "the same prompt".
    PromptId
);
string_id!(VarId);

/// Persisted catalogue of every known file and its prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PlaygroundMap {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Keyed by file path.
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
    pub updated_at: u64,
}

fn default_schema_version() -> u32 {
    PLAYGROUND_MAP_SCHEMA_VERSION
}

impl PlaygroundMap {
    #[must_use]
    pub fn empty(timestamp: u64) -> Self {
        Self {
            schema_version: PLAYGROUND_MAP_SCHEMA_VERSION,
            files: BTreeMap::new(),
            updated_at: timestamp,
        }
    }

    #[must_use]
    pub fn file_by_id(&self, file_id: &FileId) -> Option<&FileEntry> {
        self.files.values().find(|file| &file.id == file_id)
    }

    /// Resolves a reference to its file and prompt, if both still exist.
    #[must_use]
    pub fn pair(&self, prompt_ref: &PromptRef) -> Option<(&FileEntry, &PromptEntry)> {
        let file = self.file_by_id(&prompt_ref.file_id)?;
        let prompt = file.prompt(&prompt_ref.prompt_id)?;
        Some((file, prompt))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FileEntry {
    pub id: FileId,
    pub path: String,
    /// Always in parsed order.
    #[serde(default)]
    pub prompts: Vec<PromptEntry>,
    pub updated_at: u64,
}

impl FileEntry {
    #[must_use]
    pub fn prompt(&self, prompt_id: &PromptId) -> Option<&PromptEntry> {
        self.prompts.iter().find(|prompt| &prompt.id == prompt_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct PromptEntry {
    pub id: PromptId,
    /// Last known literal text.
    pub content: String,
    /// Outer span of the last occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default)]
    pub vars: Vec<VarEntry>,
    /// Time of the last real content change, not of the last reparse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct VarEntry {
    pub id: VarId,
    pub exp: String,
    /// Relative to the owning prompt's outer start.
    pub span: Span,
}

/// Points at one prompt regardless of which file is active. Used for the pin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
pub struct PromptRef {
    pub file_id: FileId,
    pub prompt_id: PromptId,
}

impl PromptRef {
    pub fn new(file_id: impl Into<String>, prompt_id: impl Into<String>) -> Self {
        Self {
            file_id: FileId::new(file_id),
            prompt_id: PromptId::new(prompt_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PromptReason {
    Cursor,
    Pinned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PromptState {
    pub file_id: FileId,
    pub prompt_id: PromptId,
    pub content: String,
    #[serde(default)]
    pub vars: Vec<VarEntry>,
    pub reason: PromptReason,
}

/// Lightweight stub used to populate a prompt picker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct PromptItem {
    pub file_id: FileId,
    pub prompt_id: PromptId,
    pub preview: String,
}

/// Derived view, recomputed on every event. Never the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema)]
pub struct PlaygroundState {
    pub file: Option<FileMeta>,
    pub prompt: Option<PromptState>,
    #[serde(default)]
    pub prompts: Vec<PromptItem>,
    pub pin: Option<PromptRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}
