// src/event.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A community group that organizes events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub logo: String,
    /// Link kind ("web", "twitter", ...) -> URL. `web` is always present after validation.
    pub links: BTreeMap<String, String>,
}

impl Group {
    pub fn new(name: impl Into<String>, logo: impl Into<String>, web: impl Into<String>) -> Self {
        let mut links = BTreeMap::new();
        links.insert("web".to_string(), web.into());
        Self {
            name: name.into(),
            logo: logo.into(),
            links,
        }
    }

    pub fn web_link(&self) -> &str {
        self.links.get("web").map(String::as_str).unwrap_or_default()
    }
}

/// One listing produced by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    date: DateTime<Utc>,
    link: String,
    kind: String,
    group: Arc<Group>,
}

impl Event {
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// Source tag, equal to the producing fetcher's `source_type()`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn group(&self) -> &Group {
        &self.group
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("event is missing required field `{0}`")]
pub struct EventBuildError(pub &'static str);

#[derive(Debug, Default)]
pub struct EventBuilder {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
    link: Option<String>,
    kind: Option<String>,
    group: Option<Arc<Group>>,
}

impl EventBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn group(mut self, group: Arc<Group>) -> Self {
        self.group = Some(group);
        self
    }

    pub fn build(self) -> Result<Event, EventBuildError> {
        Ok(Event {
            name: self.name.ok_or(EventBuildError("name"))?,
            date: self.date.ok_or(EventBuildError("date"))?,
            link: self.link.ok_or(EventBuildError("link"))?,
            kind: self.kind.ok_or(EventBuildError("kind"))?,
            group: self.group.ok_or(EventBuildError("group"))?,
        })
    }
}

/// Ordered batch of events for one cycle. Keeps fetch order; no dedup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCollection {
    events: Vec<Event>,
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Appends every event of `other`, keeping its order.
    pub fn extend(&mut self, other: EventCollection) {
        self.events.extend(other.events);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events whose date falls in `[start, end)`, in collection order.
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> EventCollection {
        self.events
            .iter()
            .filter(|ev| ev.date >= start && ev.date < end)
            .cloned()
            .collect()
    }
}

impl FromIterator<Event> for EventCollection {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for EventCollection {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
