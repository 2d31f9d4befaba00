// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cadence;
pub mod config;
pub mod dates;
pub mod error;
pub mod event;
pub mod http;

// Connectors
pub mod fetch;
pub mod notify;

// Orchestration
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::cadence::Cadence;
pub use crate::error::{ConfigError, FetchError, NotifyError};
pub use crate::event::{Event, EventCollection, Group};
pub use crate::fetch::Fetcher;
pub use crate::notify::{Notifier, PreviewSink};
pub use crate::pipeline::{CycleReport, GroupSources, Pipeline};
