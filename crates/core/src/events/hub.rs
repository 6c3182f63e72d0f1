use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn};

use crate::events::{ALL_EVENTS, EventHandler, RawEvent};

#[derive(Debug, Default)]
pub struct HubMetrics {
    pub published_total: AtomicU64,
    pub unrouted_total: AtomicU64,
    pub handler_invocations_total: AtomicU64,
    pub handler_failures_total: AtomicU64,
    pub handler_panics_total: AtomicU64,
}

/// In-process stand-in for the storefront's analytics channel.
///
/// Every handler invocation runs on its own task, so a failure or panic in one
/// never reaches another invocation or the publisher.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<EventHubInner>,
}

struct EventHubInner {
    routes: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    metrics: HubMetrics,
    tasks: Mutex<JoinSet<()>>,
}

impl EventHub {
    pub(crate) fn new(routes: HashMap<String, Vec<Arc<dyn EventHandler>>>) -> Self {
        Self {
            inner: Arc::new(EventHubInner {
                routes,
                metrics: HubMetrics::default(),
                tasks: Mutex::new(JoinSet::new()),
            }),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn publish(&self, event: RawEvent) {
        self.inner
            .metrics
            .published_total
            .fetch_add(1, Ordering::Relaxed);

        let event = Arc::new(event);
        let channels = [event.name(), ALL_EVENTS];
        let channels = if event.name() == ALL_EVENTS {
            &channels[1..]
        } else {
            &channels[..]
        };
        let handlers: Vec<Arc<dyn EventHandler>> = channels
            .iter()
            .filter_map(|name| self.inner.routes.get(*name))
            .flatten()
            .cloned()
            .collect();

        if handlers.is_empty() {
            self.inner
                .metrics
                .unrouted_total
                .fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut tasks = self.inner.tasks.lock().expect("EventHub tasks poisoned");
        while let Some(joined) = tasks.try_join_next() {
            self.record_join(joined);
        }

        self.inner
            .metrics
            .handler_invocations_total
            .fetch_add(handlers.len() as u64, Ordering::Relaxed);
        for handler in handlers {
            let event = Arc::clone(&event);
            let inner = Arc::clone(&self.inner);
            tasks.spawn(async move {
                if let Err(e) = handler.handle(Arc::clone(&event)).await {
                    inner
                        .metrics
                        .handler_failures_total
                        .fetch_add(1, Ordering::Relaxed);
                    warn!(
                        subscriber_id = handler.subscriber_id(),
                        event_name = event.name(),
                        error = %e,
                        "event handler failed"
                    );
                }
            });
        }
    }

    /// Wait for every handler invocation published so far.
    pub async fn drain(&self) {
        let mut tasks = std::mem::take(
            &mut *self.inner.tasks.lock().expect("EventHub tasks poisoned"),
        );
        while let Some(joined) = tasks.join_next().await {
            self.record_join(joined);
        }
    }

    /// Handler invocations spawned but not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.lock().expect("EventHub tasks poisoned").len()
    }

    fn record_join(&self, joined: Result<(), JoinError>) {
        if let Err(e) = joined {
            self.inner
                .metrics
                .handler_panics_total
                .fetch_add(1, Ordering::Relaxed);
            error!(error = %e, "event handler task aborted");
        }
    }

    pub fn metrics(&self) -> &HubMetrics {
        &self.inner.metrics
    }
}
