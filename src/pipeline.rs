// src/pipeline.rs
//! Fetch from every source, merge, select the cadence window, and hand the
//! result to every channel. One connector failing never stops the others.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::cadence::Cadence;
use crate::config::{ChannelConfig, GroupConfig, Settings, SourceConfig};
use crate::dates::{DateFormatter, ZonedDateFormatter};
use crate::error::{ConfigError, FetchError, NotifyError};
use crate::event::{EventCollection, Group};
use crate::fetch::{EventbriteFetcher, Fetcher};
use crate::http::{HttpTransport, ReqwestTransport};
use crate::notify::{Notifier, PreviewSink, SlackNotifier, TelegramNotifier};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_events_fetched_total",
            "Events parsed from source payloads."
        );
        describe_counter!("digest_fetch_errors_total", "Failed source fetches.");
        describe_counter!("digest_notify_errors_total", "Failed channel deliveries.");
        describe_counter!(
            "digest_messages_published_total",
            "Messages accepted by channel APIs."
        );
    });
}

/// A group and the sources it publishes events on, in fetch order.
#[derive(Debug, Clone)]
pub struct GroupSources {
    pub group: Arc<Group>,
    pub sources: Vec<SourceConfig>,
}

impl From<&GroupConfig> for GroupSources {
    fn from(g: &GroupConfig) -> Self {
        Self {
            group: Arc::new(Group {
                name: g.name.clone(),
                logo: g.logo.clone(),
                links: g.links.clone(),
            }),
            sources: g.sources.clone(),
        }
    }
}

/// Outcome of one cadence run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cadence: Cadence,
    pub preview: bool,
    /// Events returned by all sources before windowing.
    pub fetched: usize,
    /// Events handed to channels.
    pub selected: usize,
    /// Channels that completed without error.
    pub delivered: Vec<&'static str>,
    pub fetch_failures: Vec<FetchError>,
    pub notify_failures: Vec<NotifyError>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.fetch_failures.is_empty() && self.notify_failures.is_empty()
    }
}

pub struct Pipeline {
    groups: Vec<GroupSources>,
    fetchers: Vec<Box<dyn Fetcher>>,
    notifiers: Vec<Box<dyn Notifier>>,
    tz: Tz,
    upcoming: Duration,
}

impl Pipeline {
    /// Fails if a group lists a source kind with no matching fetcher.
    pub fn new(
        groups: Vec<GroupSources>,
        fetchers: Vec<Box<dyn Fetcher>>,
        notifiers: Vec<Box<dyn Notifier>>,
    ) -> Result<Self, ConfigError> {
        for gs in &groups {
            for src in &gs.sources {
                if !fetchers.iter().any(|f| f.source_type() == src.kind()) {
                    return Err(ConfigError::validation(
                        format!("groups.{}.sources", gs.group.name),
                        format!("no fetcher registered for `{}`", src.kind()),
                    ));
                }
            }
        }
        Ok(Self {
            groups,
            fetchers,
            notifiers,
            tz: chrono_tz::Europe::Madrid,
            upcoming: Duration::minutes(60),
        })
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn with_upcoming_window(mut self, window: Duration) -> Self {
        self.upcoming = window;
        self
    }

    /// Wire real connectors from validated settings.
    pub fn from_settings(
        settings: &Settings,
        transport: Arc<dyn HttpTransport>,
        sink: Arc<dyn PreviewSink>,
    ) -> Result<Self, ConfigError> {
        let tz = settings.tz()?;
        let dates: Arc<dyn DateFormatter> = Arc::new(ZonedDateFormatter::new(tz));

        let mut fetchers: Vec<Box<dyn Fetcher>> = Vec::new();
        if let Some(eb) = &settings.sources.eventbrite {
            let mut f = EventbriteFetcher::new(eb.oauth_token.clone(), transport.clone());
            if let Some(base) = &eb.base_url {
                f = f.with_base_url(base.clone());
            }
            fetchers.push(Box::new(f));
        }

        let notifiers: Vec<Box<dyn Notifier>> = settings
            .channels
            .iter()
            .map(|ch| -> Box<dyn Notifier> {
                match ch {
                    ChannelConfig::Slack(c) => Box::new(SlackNotifier::new(
                        c.clone(),
                        transport.clone(),
                        dates.clone(),
                        sink.clone(),
                    )),
                    ChannelConfig::Telegram(c) => Box::new(TelegramNotifier::new(
                        c.clone(),
                        transport.clone(),
                        dates.clone(),
                        sink.clone(),
                    )),
                }
            })
            .collect();

        let groups = settings.groups.iter().map(GroupSources::from).collect();

        Ok(Self::new(groups, fetchers, notifiers)?
            .with_timezone(tz)
            .with_upcoming_window(Duration::minutes(i64::from(settings.upcoming_window_minutes))))
    }

    /// Same as `from_settings` with a reqwest transport built from the configured timeout.
    pub fn from_settings_with_http(
        settings: &Settings,
        sink: Arc<dyn PreviewSink>,
    ) -> Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(StdDuration::from_secs(settings.http_timeout_secs))
            .map_err(|e| ConfigError::validation("http_timeout_secs", e.to_string()))?;
        Self::from_settings(settings, Arc::new(transport), sink)
    }

    fn fetcher_for(&self, kind: &str) -> Option<&dyn Fetcher> {
        self.fetchers
            .iter()
            .find(|f| f.source_type() == kind)
            .map(|f| f.as_ref())
    }

    /// Every source of every group, in configuration order.
    pub async fn fetch_all(&self) -> (EventCollection, Vec<FetchError>) {
        ensure_metrics_described();

        let mut merged = EventCollection::new();
        let mut failures = Vec::new();
        for gs in &self.groups {
            for src in &gs.sources {
                let Some(fetcher) = self.fetcher_for(src.kind()) else {
                    // Rejected in `new`; unreachable for pipelines built there.
                    continue;
                };
                match fetcher.fetch(&gs.group, src).await {
                    Ok(events) => merged.extend(events),
                    Err(e) => {
                        tracing::warn!(error = %e, group = %gs.group.name, source = e.source_type, "source fetch failed");
                        counter!("digest_fetch_errors_total", "source" => e.source_type).increment(1);
                        failures.push(e);
                    }
                }
            }
        }
        (merged, failures)
    }

    /// Every channel, in configuration order, against the same collection.
    pub async fn notify_all(
        &self,
        cadence: Cadence,
        events: &EventCollection,
        preview: bool,
    ) -> (Vec<&'static str>, Vec<NotifyError>) {
        ensure_metrics_described();

        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            match notifier.notify(cadence, events, preview).await {
                Ok(()) => delivered.push(notifier.channel_type()),
                Err(e) => {
                    tracing::warn!(error = %e, channel = e.channel_type, %cadence, "channel notify failed");
                    counter!("digest_notify_errors_total", "channel" => e.channel_type).increment(1);
                    failures.push(e);
                }
            }
        }
        (delivered, failures)
    }

    /// One full cycle at `now`.
    pub async fn run(&self, cadence: Cadence, preview: bool, now: DateTime<Utc>) -> CycleReport {
        let (all, fetch_failures) = self.fetch_all().await;
        let (start, end) = cadence.window(now, self.tz, self.upcoming);
        let selected = all.within(start, end);

        tracing::info!(
            %cadence,
            preview,
            fetched = all.len(),
            selected = selected.len(),
            fetch_failures = fetch_failures.len(),
            "events collected"
        );

        let (delivered, notify_failures) = self.notify_all(cadence, &selected, preview).await;

        CycleReport {
            cadence,
            preview,
            fetched: all.len(),
            selected: selected.len(),
            delivered,
            fetch_failures,
            notify_failures,
        }
    }
}
