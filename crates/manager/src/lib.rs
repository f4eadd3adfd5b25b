//! # Playground Manager
//!
//! Serializes editor events and view messages through the resolver and keeps the
//! persisted catalogue and pin up to date.
//!
//! ```text
//! EditorEvent / ClientMessage
//!     │
//!     └──> FIFO task queue (one tokio task)
//!            ├─> ParseCache ──> PromptParser
//!            ├─> reconcile_map ──> Store (only when the map changed)
//!            ├─> resolve_state ──> watch channel
//!            └─> PlaygroundSink (state update, reveal)
//! ```

mod config;
mod error;
mod manager;
mod parser;
mod sink;
mod store;

pub use config::{PlaygroundConfig, DEFAULT_MAP_KEY, DEFAULT_PIN_KEY};
pub use error::{ManagerError, Result};
pub use manager::{unix_ms_now, Clock, Collaborators, PlaygroundManager};
pub use parser::{ParseCache, ParseError, ParseOutcome, ParseSource, PromptParser};
pub use sink::{ChannelSink, PlaygroundSink};
pub use store::{load, save, JsonFileStore, MemoryStore, Store, StoreScope};
