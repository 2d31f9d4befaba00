// src/notify/mod.rs
//! Channels that render an `EventCollection` and publish it.

pub mod preview;
pub mod slack;
pub mod telegram;

use async_trait::async_trait;

use crate::cadence::Cadence;
use crate::error::NotifyError;
use crate::event::EventCollection;

pub use preview::{PreviewSink, StdoutPreview};
pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel_type(&self) -> &'static str;

    /// Where `preview` output goes instead of the network.
    fn preview_sink(&self) -> &dyn PreviewSink;

    async fn notify_weekly(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError>;
    async fn notify_daily(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError>;
    async fn notify_upcoming(&self, events: &EventCollection, preview: bool) -> Result<(), NotifyError>;

    async fn notify(
        &self,
        cadence: Cadence,
        events: &EventCollection,
        preview: bool,
    ) -> Result<(), NotifyError> {
        match cadence {
            Cadence::Weekly => self.notify_weekly(events, preview).await,
            Cadence::Daily => self.notify_daily(events, preview).await,
            Cadence::Upcoming => self.notify_upcoming(events, preview).await,
        }
    }

    /// Render `text` locally; shared by every channel.
    fn preview(&self, text: &str) {
        self.preview_sink().emit(self.channel_type(), text);
    }
}

/// Headline for a digest of `count` events. Upcoming alerts carry no total.
pub fn headline(cadence: Cadence, count: usize) -> String {
    match (cadence, count) {
        (Cadence::Weekly, 1) => "⬇️⬇️⬇️ There is *1* event this week ⬇️⬇️⬇️".to_string(),
        (Cadence::Weekly, n) => format!("⬇️⬇️⬇️ There are *{n}* events this week ⬇️⬇️⬇️"),
        (Cadence::Daily, 1) => "⬇️⬇️⬇️ Today there is *1* event ⬇️⬇️⬇️".to_string(),
        (Cadence::Daily, n) => format!("⬇️⬇️⬇️ Today there are *{n}* events ⬇️⬇️⬇️"),
        (Cadence::Upcoming, 1) => "🚨🚨🚨 Event starting soon 🚨🚨🚨".to_string(),
        (Cadence::Upcoming, _) => "🚨🚨🚨 Events starting soon 🚨🚨🚨".to_string(),
    }
}

/// Masks `secret` in a transport error. Request URLs embed channel credentials.
pub(crate) fn redact(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    message.replace(secret, "***")
}
