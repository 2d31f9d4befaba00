// src/fetch/mod.rs
pub mod eventbrite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::event::{EventCollection, Group};

pub use eventbrite::EventbriteFetcher;

/// One external event-listing provider.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Tag stamped on every produced event; matches `SourceConfig::kind()`.
    fn source_type(&self) -> &'static str;

    async fn fetch(&self, group: &Arc<Group>, source: &SourceConfig) -> Result<EventCollection, FetchError>;
}
