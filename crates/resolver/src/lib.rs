//! # Playground Resolver
//!
//! Keeps prompt identities stable while their source files are edited, renamed and
//! reordered, and derives the playground view from the result. Everything here is pure:
//! time and id generation come in through [`MatchContext`].
//!
//! ## Pipeline
//!
//! ```text
//! ParsedPrompt[] (active path)
//!     │
//!     ├──> File Resolver
//!     │      ├─> same-path entry   (score >= 0.6)
//!     │      └─> best entry in map (score >= 0.4)
//!     │
//!     ├──> Prompt-Set Matcher
//!     │      ├─> Content Matcher   (normalized equality)
//!     │      └─> Distance Matcher  (greedy, ratio < 0.6)
//!     │
//!     ├──> Map Updater
//!     │      └─> PlaygroundMap (unchanged or rewritten)
//!     │
//!     └──> State Resolver (cursor, pin)
//!            └─> PlaygroundState
//! ```
//!
//! ## Example
//!
//! ```
//! use playground_protocol::{EditorFile, ParsedPrompt, PlaygroundMap, Span, SpanShape};
//! use playground_resolver::{reconcile_map, resolve_state, MatchContext, SequentialIds, StateInput};
//!
//! let ids = SequentialIds::new("id");
//! let parsed = vec![ParsedPrompt {
//!     path: "src/app.ts".to_string(),
//!     content: "Hello, world!".to_string(),
//!     span: SpanShape { outer: Span::new(0, 15), inner: Span::new(1, 14) },
//!     variables: Vec::new(),
//! }];
//!
//! let map = PlaygroundMap::empty(0);
//! let reconciled = reconcile_map(&map, "src/app.ts", &parsed, &MatchContext::new(1, &ids));
//! let file = EditorFile::new("src/app.ts", "").with_cursor(3);
//! let state = resolve_state(&StateInput::new(&reconciled.map).with_file(Some(&file), &parsed));
//!
//! assert_eq!(state.prompts.len(), 1);
//! assert!(state.prompt.is_some());
//! ```

mod config;
mod content;
mod distance;
mod error;
mod file;
mod ids;
mod map;
mod prompts;
mod state;
mod table;
mod text;
mod vars;

#[cfg(test)]
mod test_support;

pub use config::{
    MatchThresholds, MATCH_BY_DISTANCE_THRESHOLD, MATCH_BY_PATH_THRESHOLD,
    MAX_PROMPT_DISTANCE_RATIO,
};
pub use content::match_by_content;
pub use distance::match_by_distance;
pub use error::{ResolverError, Result};
pub use file::{resolve_file, FileMatch, FileResolution, ResolveTier};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use map::{create_file_entry, reconcile_map, ReconcileOutcome, Reconciliation};
pub use prompts::{
    match_prompt_set, new_prompt_entry, MatchContext, PromptOrigin, PromptSetMatch, RebuiltPrompt,
};
pub use state::{prompt_items, resolve_state, sanitize_pin, StateInput, DEFAULT_PREVIEW_LENGTH};
pub use table::{MatchTable, MatchTier, PassOutcome, PromptMatch};
pub use text::{distance_ratio, levenshtein, normalize_content, preview};
pub use vars::match_vars;
