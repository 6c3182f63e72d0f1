use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::{Result, TapError},
    events::{EventHub, RawEvent},
};

/// Channel that receives every event regardless of name.
pub const ALL_EVENTS: &str = "all_events";

#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    fn subscriber_id(&self) -> &'static str;

    async fn handle(&self, event: Arc<RawEvent>) -> Result<()>;
}

/// Subscription capability handed to an activation by its host.
pub trait Analytics {
    fn subscribe(&mut self, event_name: &str, handler: Arc<dyn EventHandler>);
}

pub(crate) struct Subscription {
    pub event_name: String,
    pub handler: Arc<dyn EventHandler>,
}

fn validate(subs: &[Subscription]) -> Result<()> {
    use std::collections::HashSet;

    let mut seen: HashSet<(&str, &'static str)> = HashSet::new();
    for s in subs {
        if s.event_name.trim().is_empty() {
            return Err(TapError::InvalidSubscription {
                reason: format!(
                    "subscriber_id={} has empty event name",
                    s.handler.subscriber_id()
                ),
            });
        }
        if !seen.insert((s.event_name.as_str(), s.handler.subscriber_id())) {
            return Err(TapError::InvalidSubscription {
                reason: format!(
                    "subscriber_id={} subscribed twice to {}",
                    s.handler.subscriber_id(),
                    s.event_name
                ),
            });
        }
    }
    Ok(())
}

/// Collects subscriptions, then freezes them into an [`EventHub`].
#[derive(Default)]
pub struct EventHubBuilder {
    subs: Vec<Subscription>,
}

impl EventHubBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Result<EventHub> {
        validate(&self.subs)?;

        let mut routes: HashMap<String, Vec<Arc<dyn EventHandler>>> = HashMap::new();
        for sub in self.subs {
            routes.entry(sub.event_name).or_default().push(sub.handler);
        }

        Ok(EventHub::new(routes))
    }
}

impl Analytics for EventHubBuilder {
    fn subscribe(&mut self, event_name: &str, handler: Arc<dyn EventHandler>) {
        self.subs.push(Subscription {
            event_name: event_name.to_string(),
            handler,
        });
    }
}
