use crate::{EditorFile, PlaygroundState, PromptRef, Span};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Push events from the editor host. Each carries the file's current content and cursor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", content = "file", rename_all = "kebab-case")]
pub enum EditorEvent {
    ActiveChanged(Option<EditorFile>),
    CursorUpdated(EditorFile),
    FileSaved(EditorFile),
    FileChanged(EditorFile),
}

impl EditorEvent {
    #[must_use]
    pub fn file(&self) -> Option<&EditorFile> {
        match self {
            Self::ActiveChanged(file) => file.as_ref(),
            Self::CursorUpdated(file) | Self::FileSaved(file) | Self::FileChanged(file) => {
                Some(file)
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveChanged(_) => "active-changed",
            Self::CursorUpdated(_) => "cursor-updated",
            Self::FileSaved(_) => "file-saved",
            Self::FileChanged(_) => "file-changed",
        }
    }
}

/// Control messages sent by the playground view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    RequestState,
    Pin(PromptRef),
    Unpin,
    /// The view switched selection without a cursor move. `None` drops the pin.
    PromptChange(Option<PromptRef>),
}

/// Where the host should move the cursor so a prompt becomes active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct RevealTarget {
    pub prompt: PromptRef,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    StateUpdate(PlaygroundState),
    Reveal(RevealTarget),
}
