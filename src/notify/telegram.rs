// src/notify/telegram.rs
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::json;

use super::{headline, redact, Notifier, PreviewSink};
use crate::cadence::Cadence;
use crate::config::TelegramConfig;
use crate::dates::DateFormatter;
use crate::error::NotifyError;
use crate::event::{Event, EventCollection};
use crate::http::HttpTransport;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Escapes the entity markers of Telegram's legacy Markdown so names render literally.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Bot API channel: one headline message, then one message per event.
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    disable_notification: bool,
    api_base: String,
    transport: Arc<dyn HttpTransport>,
    dates: Arc<dyn DateFormatter>,
    sink: Arc<dyn PreviewSink>,
}

impl TelegramNotifier {
    pub fn new(
        config: TelegramConfig,
        transport: Arc<dyn HttpTransport>,
        dates: Arc<dyn DateFormatter>,
        sink: Arc<dyn PreviewSink>,
    ) -> Self {
        Self {
            token: config.token,
            chat_id: config.chat_id,
            disable_notification: config.disable_notification,
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            transport,
            dates,
            sink,
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }

    fn event_body(&self, cadence: Cadence, ev: &Event) -> String {
        let group = escape_markdown(&ev.group().name);
        let name = escape_markdown(ev.name());
        match cadence {
            Cadence::Weekly => format!(
                "{group}\n📅 _{}_.\n▶️ *«{name}»*\nℹ [more info]({})",
                self.dates.format(ev.date()),
                ev.link()
            ),
            Cadence::Daily => format!(
                "*{group}*\n📅 _{}_.\n▶️ *«{name}»*\nℹ [more info]({})",
                self.dates.format(ev.date()),
                ev.link()
            ),
            Cadence::Upcoming => format!(
                "*{group}*\n🚨 «{name}»\n🕗 Starting soon (at {}).\nℹ {}",
                self.dates.hour(ev.date()),
                ev.link()
            ),
        }
    }

    /// Headline followed by one body per event. Empty for an empty collection.
    pub fn compose_messages(&self, cadence: Cadence, events: &EventCollection) -> Vec<String> {
        if events.is_empty() {
            return Vec::new();
        }
        std::iter::once(headline(cadence, events.len()))
            .chain(events.iter().map(|ev| self.event_body(cadence, ev)))
            .collect()
    }

    async fn digest(
        &self,
        cadence: Cadence,
        events: &EventCollection,
        preview: bool,
    ) -> Result<(), NotifyError> {
        for text in self.compose_messages(cadence, events) {
            self.publish(&text, preview).await?;
        }
        Ok(())
    }

    async fn publish(&self, text: &str, preview: bool) -> Result<(), NotifyError> {
        if preview {
            self.preview(text);
            return Ok(());
        }

        let body = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "markdown",
            "disable_notification": self.disable_notification,
        });
        self.transport
            .post_json(&self.send_message_url(), &body)
            .await
            .map_err(|e| NotifyError::new(self.channel_type(), redact(&e.to_string(), &self.token)))?;

        counter!("digest_messages_published_total", "channel" => "telegram").increment(1);
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel_type(&self) -> &'static str {
        "telegram"
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
