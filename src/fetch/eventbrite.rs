// src/fetch/eventbrite.rs
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;

use super::Fetcher;
use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::event::{Event, EventCollection, Group};
use crate::http::HttpTransport;

const DEFAULT_BASE_URL: &str = "https://www.eventbriteapi.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    events: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    start: Start,
    name: Text,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Start {
    utc: String,
}

#[derive(Debug, Deserialize)]
struct Text {
    text: String,
}

pub struct EventbriteFetcher {
    oauth_token: String,
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl EventbriteFetcher {
    pub fn new(oauth_token: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            oauth_token: oauth_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
        }
    }

    /// Point at another API host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_url(&self) -> String {
        format!("{}/v3/events/search/", self.base_url.trim_end_matches('/'))
    }

    fn parse_events(&self, group: &Arc<Group>, body: serde_json::Value) -> Result<EventCollection, FetchError> {
        let resp: SearchResponse = serde_json::from_value(body)
            .map_err(|e| FetchError::new(self.source_type(), format!("malformed response: {e}")))?;

        let mut events = EventCollection::new();
        for item in resp.events {
            let date = DateTime::parse_from_rfc3339(&item.start.utc)
                .map_err(|e| {
                    FetchError::new(
                        self.source_type(),
                        format!("bad start.utc `{}`: {e}", item.start.utc),
                    )
                })?
                .with_timezone(&Utc);

            let event = Event::builder()
                .name(item.name.text)
                .date(date)
                .group(group.clone())
                .link(item.url)
                .kind(self.source_type())
                .build()
                .map_err(|e| FetchError::new(self.source_type(), e))?;
            events.add(event);
        }
        Ok(events)
    }
}

#[async_trait]
impl Fetcher for EventbriteFetcher {
    fn source_type(&self) -> &'static str {
        "eventbrite"
    }

    async fn fetch(&self, group: &Arc<Group>, source: &SourceConfig) -> Result<EventCollection, FetchError> {
        let SourceConfig::Eventbrite(cfg) = source;
        let t0 = Instant::now();

        let body = self
            .transport
            .get_json(
                &self.search_url(),
                &[("organizer.id", cfg.organizer_id.as_str())],
                Some(self.oauth_token.as_str()),
            )
            .await
            .map_err(|e| FetchError::new(self.source_type(), e))?;

        let events = self.parse_events(group, body)?;

        counter!("digest_events_fetched_total", "source" => "eventbrite").increment(events.len() as u64);
        tracing::debug!(
            group = %group.name,
            organizer = %cfg.organizer_id,
            events = events.len(),
            ms = t0.elapsed().as_millis() as u64,
            "eventbrite fetch"
        );
        Ok(events)
    }
}
