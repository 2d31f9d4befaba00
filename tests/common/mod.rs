// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use event_digest::http::{HttpTransport, TransportError};
use event_digest::{Event, EventCollection, Group, PreviewSink};

#[derive(Debug, Clone)]
pub struct GetCall {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub bearer: Option<String>,
}

/// Canned GET bodies keyed by `organizer.id`; records every call.
#[derive(Default)]
pub struct RecordingTransport {
    bodies: HashMap<String, Value>,
    failing_posts: HashSet<String>,
    pub gets: Mutex<Vec<GetCall>>,
    pub posts: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organizer(mut self, organizer_id: &str, body: Value) -> Self {
        self.bodies.insert(organizer_id.to_string(), body);
        self
    }

    pub fn failing_post(mut self, url: &str) -> Self {
        self.failing_posts.insert(url.to_string());
        self
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().len()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.gets.lock().push(GetCall {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            bearer: bearer.map(str::to_string),
        });
        let organizer = query
            .iter()
            .find(|(k, _)| *k == "organizer.id")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        self.bodies
            .get(organizer)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 500,
                body: format!("no canned body for organizer {organizer}"),
            })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<(), TransportError> {
        self.posts.lock().push((url.to_string(), body.clone()));
        if self.failing_posts.contains(url) {
            return Err(TransportError::Status {
                status: 404,
                body: "no_service".into(),
            });
        }
        Ok(())
    }
}

/// Keeps preview output in memory.
#[derive(Default)]
pub struct CapturedPreview {
    pub lines: Mutex<Vec<(String, String)>>,
}

impl CapturedPreview {
    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl PreviewSink for CapturedPreview {
    fn emit(&self, channel: &str, text: &str) {
        self.lines.lock().push((channel.to_string(), text.to_string()));
    }
}

pub fn group(name: &str) -> Arc<Group> {
    Arc::new(Group::new(
        name,
        format!("https://img.test/{name}.png"),
        format!("https://{name}.test"),
    ))
}

pub fn event(group: &Arc<Group>, name: &str, link: &str, date: DateTime<Utc>) -> Event {
    Event::builder()
        .name(name)
        .date(date)
        .link(link)
        .kind("eventbrite")
        .group(group.clone())
        .build()
        .expect("all fields set")
}

pub fn collection(n: usize, date: DateTime<Utc>) -> EventCollection {
    let g = group("vigojug");
    (0..n)
        .map(|i| event(&g, &format!("Talk {i}"), &format!("https://x/{i}"), date))
        .collect()
}

/// Eventbrite search body with one item per `(utc, name, url)`.
pub fn eventbrite_body(items: &[(&str, &str, &str)]) -> Value {
    let events: Vec<Value> = items
        .iter()
        .map(|(utc, name, url)| {
            json!({
                "start": { "utc": utc, "timezone": "Europe/Madrid" },
                "name": { "text": name, "html": name },
                "url": url,
            })
        })
        .collect();
    json!({ "pagination": { "object_count": events.len() }, "events": events })
}
