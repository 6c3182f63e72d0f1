//! Activation entry point: resolves identity and context once, then turns
//! every subscribed event into a canonical record and forwards it.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tracing::{error, info};

use crate::{
    context::{DEFAULT_SIGNALS, capture_context},
    dispatch::{Dispatcher, Transport},
    error::Result,
    events::{ALL_EVENTS, Analytics, EventHandler, RawEvent},
    identity::{new_session_token, resolve_visitor_identity},
    normalize::{Correlation, normalize},
    settings::Settings,
    store::KeyValueStore,
    types::CanonicalEvent,
};

/// Events that also get a dedicated subscription for capture logging.
pub const HIGH_VALUE_EVENTS: &[&str] = &[
    "page_viewed",
    "product_viewed",
    "product_added_to_cart",
    "checkout_started",
    "checkout_completed",
    "payment_info_submitted",
];

/// Capabilities the host hands to an activation.
pub struct Host<'a> {
    pub analytics: &'a mut dyn Analytics,
    pub store: Arc<dyn KeyValueStore>,
    pub transport: Arc<dyn Transport>,
    pub settings: Settings,
    pub initial_state: Option<RawEvent>,
}

#[derive(Debug, Default)]
pub struct TapStats {
    pub captured_total: AtomicU64,
    pub delivered_total: AtomicU64,
    pub failed_total: AtomicU64,
}

pub struct Tap {
    correlation: Correlation,
    initial_state: Option<RawEvent>,
    dispatcher: Dispatcher,
    stats: TapStats,
}

impl Tap {
    pub const SUBSCRIBER_ID: &'static str = "pixeltap.forward";

    pub fn correlation(&self) -> &Correlation {
        &self.correlation
    }

    pub fn stats(&self) -> &TapStats {
        &self.stats
    }

    pub fn canonicalize(&self, event: &RawEvent) -> CanonicalEvent {
        normalize(event, self.initial_state.as_ref(), &self.correlation)
    }

    /// Normalize and deliver one event, surfacing delivery errors.
    pub async fn forward(&self, event: &RawEvent) -> Result<CanonicalEvent> {
        let canonical = self.canonicalize(event);
        self.dispatcher.deliver(&canonical).await?;
        Ok(canonical)
    }
}

#[async_trait]
impl EventHandler for Tap {
    fn subscriber_id(&self) -> &'static str {
        Self::SUBSCRIBER_ID
    }

    /// Delivery failures are logged and swallowed.
    async fn handle(&self, event: Arc<RawEvent>) -> Result<()> {
        self.stats.captured_total.fetch_add(1, Ordering::Relaxed);

        match self.forward(&event).await {
            Ok(canonical) => {
                self.stats.delivered_total.fetch_add(1, Ordering::Relaxed);
                info!(
                    event_name = event.name(),
                    event_type = %canonical.event_type,
                    "event sent to webhook"
                );
            }
            Err(e) => {
                self.stats.failed_total.fetch_add(1, Ordering::Relaxed);
                error!(
                    event_name = event.name(),
                    error = %e,
                    "failed to send event to webhook"
                );
            }
        }
        Ok(())
    }
}

struct HighValueWatcher;

#[async_trait]
impl EventHandler for HighValueWatcher {
    fn subscriber_id(&self) -> &'static str {
        "pixeltap.high_value"
    }

    async fn handle(&self, event: Arc<RawEvent>) -> Result<()> {
        info!(event_name = event.name(), event_id = ?event.id(), "high-value event captured");
        Ok(())
    }
}

/// Bootstrap one activation and subscribe it to the host's event stream.
///
/// Fails only on unusable settings; store failures degrade to a fresh
/// identity and absent context signals.
pub async fn activate(host: Host<'_>) -> Result<Arc<Tap>> {
    let Host {
        analytics,
        store,
        transport,
        settings,
        initial_state,
    } = host;

    let settings = settings.resolve()?;
    info!(
        shop = %settings.shop_name,
        webhook_url = %settings.webhook_url,
        "initializing pixel analytics"
    );

    let identity = resolve_visitor_identity(store.as_ref()).await;
    let context = capture_context(store.as_ref(), DEFAULT_SIGNALS).await;
    let session = new_session_token();
    info!(muid = %identity, session_id = %session, "using muid for user identification");

    let tap = Arc::new(Tap {
        correlation: Correlation {
            shop: settings.shop_name,
            identity,
            session,
            context,
        },
        initial_state,
        dispatcher: Dispatcher::new(settings.webhook_url, transport, settings.forward_cookies),
        stats: TapStats::default(),
    });

    analytics.subscribe(ALL_EVENTS, tap.clone());
    let watcher: Arc<dyn EventHandler> = Arc::new(HighValueWatcher);
    for name in HIGH_VALUE_EVENTS {
        analytics.subscribe(name, Arc::clone(&watcher));
    }

    info!(
        high_value_events = HIGH_VALUE_EVENTS.len(),
        "subscribed to all_events and high-value events"
    );
    Ok(tap)
}
