// src/notify/slack.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;

use super::{headline, redact, Notifier, PreviewSink};
use crate::cadence::Cadence;
use crate::config::SlackConfig;
use crate::dates::DateFormatter;
use crate::error::NotifyError;
use crate::event::EventCollection;
use crate::http::HttpTransport;

const ATTACHMENT_COLOR: &str = "#D00000";

/// Path part of an incoming-webhook URL. It is the credential; the host is public.
fn webhook_secret(url: &str) -> &str {
    url.split_once("://")
        .and_then(|(_, rest)| rest.find('/').map(|i| &rest[i..]))
        .filter(|path| path.len() > 1)
        .unwrap_or(url)
}

/// Incoming-webhook payload with one attachment per event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlackPayload {
    pub username: String,
    pub icon_url: String,
    pub text: String,
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlackAttachment {
    pub color: &'static str,
    pub author_name: String,
    pub author_link: String,
    pub author_icon: String,
    /// Formatted event date.
    pub text: String,
    pub title: String,
    pub title_link: String,
    pub fields: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
}

pub struct SlackNotifier {
    webhook_url: String,
    name: String,
    icon_url: String,
    show_group_thumbs: bool,
    transport: Arc<dyn HttpTransport>,
    dates: Arc<dyn DateFormatter>,
    sink: Arc<dyn PreviewSink>,
}

impl SlackNotifier {
    pub fn new(
        config: SlackConfig,
        transport: Arc<dyn HttpTransport>,
        dates: Arc<dyn DateFormatter>,
        sink: Arc<dyn PreviewSink>,
    ) -> Self {
        Self {
            webhook_url: config.webhook_url,
            name: config.name,
            // Slack rejects raw spaces in icon URLs.
            icon_url: config.icon_url.replace(' ', "%20"),
            show_group_thumbs: config.show_group_thumbs,
            transport,
            dates,
            sink,
        }
    }

    pub fn compose_payload(&self, text: String, events: &EventCollection) -> SlackPayload {
        let attachments = events
            .iter()
            .map(|ev| {
                let group = ev.group();
                SlackAttachment {
                    color: ATTACHMENT_COLOR,
                    author_name: group.name.clone(),
                    author_link: group.web_link().to_string(),
                    author_icon: group.logo.clone(),
                    text: self.dates.format(ev.date()),
                    title: ev.name().to_string(),
                    title_link: ev.link().to_string(),
                    fields: Vec::new(),
                    thumb_url: self.show_group_thumbs.then(|| group.logo.clone()),
                }
            })
            .collect();

        SlackPayload {
            username: self.name.clone(),
            icon_url: self.icon_url.clone(),
            text,
            attachments,
        }
    }

    async fn digest(
        &self,
        cadence: Cadence,
        events: &EventCollection,
        preview: bool,
    ) -> Result<(), NotifyError> {
        if events.is_empty() {
            return Ok(());
        }
        let payload = self.compose_payload(headline(cadence, events.len()), events);
        self.publish(&payload, preview).await
    }

    async fn publish(&self, payload: &SlackPayload, preview: bool) -> Result<(), NotifyError> {
        if preview {
            self.preview(&payload.text);
            return Ok(());
        }

        let body = serde_json::to_value(payload)
            .map_err(|e| NotifyError::new(self.channel_type(), e))?;
        self.transport
            .post_json(&self.webhook_url, &body)
            .await
            .map_err(|e| {
                let message = redact(&e.to_string(), webhook_secret(&self.webhook_url));
                NotifyError::new(self.channel_type(), message)
            })?;

        counter!("digest_messages_published_total", "channel" => "slack").increment(1);
        tracing::debug!(attachments = payload.attachments.len(), "slack digest posted");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel_type(&self) -> &'static str {
        "slack"
    }

    fn preview_sink(&self) -> &dyn PreviewSink {
        self.sink.as_ref()
    }

    async fn notify_weekly(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError> {
        self.digest(Cadence::Weekly, events, preview).await
    }

    async fn notify_daily(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError> {
        self.digest(Cadence::Daily, events, preview).await
    }

    async fn notify_upcoming(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError> {
        self.digest(Cadence::Upcoming, events, preview).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ZonedDateFormatter;
    use crate::event::{Event, Group};
    use crate::http::TransportError;
    use crate::notify::StdoutPreview;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    struct Unreachable;

    /// Fails like reqwest does, echoing the request URL.
    struct EchoingFailure;

    #[async_trait]
    impl HttpTransport for EchoingFailure {
        async fn get_json(&self, _: &str, _: &[(&str, &str)], _: Option<&str>) -> Result<Value, TransportError> {
            unreachable!("slack never GETs")
        }
        async fn post_json(&self, url: &str, _: &Value) -> Result<(), TransportError> {
            Err(TransportError::Decode(format!("error sending request for url ({url})")))
        }
    }

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn get_json(&self, _: &str, _: &[(&str, &str)], _: Option<&str>) -> Result<Value, TransportError> {
            unreachable!("slack never GETs")
        }
        async fn post_json(&self, _: &str, _: &Value) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn notifier(thumbs: bool) -> SlackNotifier {
        SlackNotifier::new(
            SlackConfig {
                webhook_url: "https://hooks.test/x".into(),
                name: "Events bot".into(),
                icon_url: "https://img.test/my icon.png".into(),
                show_group_thumbs: thumbs,
            },
            Arc::new(Unreachable),
            Arc::new(ZonedDateFormatter::new(chrono_tz::UTC)),
            Arc::new(StdoutPreview),
        )
    }

    fn one_event() -> EventCollection {
        let group = Arc::new(Group::new("VigoJUG", "https://img.test/jug.png", "https://jug.test"));
        let mut c = EventCollection::new();
        c.add(
            Event::builder()
                .name("Meetup #42")
                .date(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap())
                .link("https://x/42")
                .kind("eventbrite")
                .group(group)
                .build()
                .unwrap(),
        );
        c
    }

    #[test]
    fn icon_url_spaces_are_encoded() {
        let p = notifier(false).compose_payload("hi".into(), &one_event());
        assert_eq!(p.icon_url, "https://img.test/my%20icon.png");
        assert_eq!(p.username, "Events bot");
    }

    #[test]
    fn attachment_carries_group_and_event_fields() {
        let p = notifier(false).compose_payload("hi".into(), &one_event());
        let a = &p.attachments[0];
        assert_eq!(a.color, "#D00000");
        assert_eq!(a.author_name, "VigoJUG");
        assert_eq!(a.author_link, "https://jug.test");
        assert_eq!(a.author_icon, "https://img.test/jug.png");
        assert_eq!(a.title, "Meetup #42");
        assert_eq!(a.title_link, "https://x/42");
        assert_eq!(a.text, "Friday, 1 March 2024 18:00");
        assert!(a.thumb_url.is_none());

        let json = serde_json::to_value(&p).unwrap();
        assert!(json["attachments"][0].get("thumb_url").is_none());
        assert_eq!(json["attachments"][0]["fields"], serde_json::json!([]));
    }

    #[test]
    fn webhook_secret_is_the_path() {
        assert_eq!(webhook_secret("https://hooks.slack.com/services/T0/B0/XYZ"), "/services/T0/B0/XYZ");
        assert_eq!(webhook_secret("https://hooks.slack.com/"), "https://hooks.slack.com/");
        assert_eq!(webhook_secret("not a url"), "not a url");
    }

    #[tokio::test]
    async fn errors_do_not_leak_the_webhook() {
        let slack = SlackNotifier::new(
            SlackConfig {
                webhook_url: "http://127.0.0.1:1/services/T000/B000/SECRETXYZ".into(),
                name: "Events bot".into(),
                icon_url: "https://img.test/bot.png".into(),
                show_group_thumbs: false,
            },
            Arc::new(EchoingFailure),
            Arc::new(ZonedDateFormatter::new(chrono_tz::UTC)),
            Arc::new(StdoutPreview),
        );
        let err = slack.notify_weekly(&one_event(), false).await.unwrap_err();
        assert_eq!(err.channel_type, "slack");
        assert!(!err.message.contains("SECRETXYZ"), "{}", err.message);
        assert!(err.message.contains("http://127.0.0.1:1***"), "{}", err.message);
    }

    #[test]
    fn thumbnails_follow_config() {
        let p = notifier(true).compose_payload("hi".into(), &one_event());
        assert_eq!(p.attachments[0].thumb_url.as_deref(), Some("https://img.test/jug.png"));
    }
}
