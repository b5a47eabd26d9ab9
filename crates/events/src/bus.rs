//! EventBus - Synchronous fan-out to subscribers
//!
//! Delivery is best-effort: a failing handler is logged and skipped, the
//! remaining handlers still run. Nothing is retried or persisted.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use shared::{GrcError, Result, TenantId, TopicPattern, DEFAULT_EVENT_HISTORY};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Receives events matching a subscription
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<()> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<()> {
        self(event)
    }
}

/// Receives every published event for the audit trail
pub trait EventAuditSink: Send + Sync {
    fn record_event(&self, event: &Event) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Outcome of one publish call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReport {
    pub event_id: String,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusStats {
    pub published: u64,
    pub delivered: u64,
    pub failed: u64,
    pub subscribers: usize,
    pub history_len: usize,
}

struct Subscription {
    id: SubscriptionId,
    name: String,
    pattern: TopicPattern,
    handler: Arc<dyn EventHandler>,
}

struct BusState {
    subscriptions: Vec<Subscription>,
    history: VecDeque<Event>,
    capacity: usize,
    next_id: u64,
    published: u64,
    delivered: u64,
    failed: u64,
}

/// In-process event bus
pub struct EventBus {
    state: RwLock<BusState>,
    audit_sink: RwLock<Option<Arc<dyn EventAuditSink>>>,
}

impl EventBus {
    /// Create a bus keeping the last `capacity` events
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: RwLock::new(BusState {
                subscriptions: Vec::new(),
                history: VecDeque::with_capacity(capacity),
                capacity,
                next_id: 1,
                published: 0,
                delivered: 0,
                failed: 0,
            }),
            audit_sink: RwLock::new(None),
        }
    }

    /// Install the sink that records every published event
    pub fn set_audit_sink(&self, sink: Arc<dyn EventAuditSink>) -> Result<()> {
        let mut slot = self
            .audit_sink
            .write()
            .map_err(|_| GrcError::LockPoisoned("event bus audit sink"))?;
        *slot = Some(sink);
        Ok(())
    }

    /// Subscribe a handler to every topic matching `pattern`
    pub fn subscribe(
        &self,
        name: impl Into<String>,
        pattern: TopicPattern,
        handler: Arc<dyn EventHandler>,
    ) -> Result<SubscriptionId> {
        let mut state = self.write_state()?;
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;

        let name = name.into();
        debug!(subscription = %id, name = %name, pattern = pattern.as_str(), "subscribed");
        state.subscriptions.push(Subscription {
            id,
            name,
            pattern,
            handler,
        });
        Ok(id)
    }

    /// Remove a subscription. Returns false when it did not exist.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let mut state = self.write_state()?;
        let before = state.subscriptions.len();
        state.subscriptions.retain(|s| s.id != id);
        Ok(state.subscriptions.len() != before)
    }

    /// Publish an event to the history, the audit sink and every matching handler
    pub fn publish(&self, event: Event) -> Result<PublishReport> {
        let handlers: Vec<(String, Arc<dyn EventHandler>)> = {
            let mut state = self.write_state()?;
            if state.history.len() >= state.capacity {
                state.history.pop_front();
            }
            state.history.push_back(event.clone());
            state.published += 1;

            state
                .subscriptions
                .iter()
                .filter(|s| s.pattern.matches(&event.event_type))
                .map(|s| (s.name.clone(), Arc::clone(&s.handler)))
                .collect()
        };

        self.record_audit(&event);

        // Handlers run without the lock held so they may publish in turn
        let mut delivered = 0;
        let mut failed = 0;
        for (name, handler) in handlers {
            match handler.handle(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        subscriber = %name,
                        event_type = %event.event_type,
                        event_id = %event.id,
                        error = %e,
                        "event handler failed"
                    );
                }
            }
        }

        {
            let mut state = self.write_state()?;
            state.delivered += delivered as u64;
            state.failed += failed as u64;
        }

        debug!(
            event_type = %event.event_type,
            tenant = %event.tenant_id,
            delivered,
            failed,
            "event published"
        );

        Ok(PublishReport {
            event_id: event.id,
            delivered,
            failed,
        })
    }

    fn record_audit(&self, event: &Event) {
        let sink = match self.audit_sink.read() {
            Ok(slot) => slot.clone(),
            Err(_) => {
                warn!(event_id = %event.id, "audit sink lock poisoned, event not audited");
                return;
            }
        };

        if let Some(sink) = sink {
            if let Err(e) = sink.record_event(event) {
                warn!(event_id = %event.id, error = %e, "failed to audit event");
            }
        }
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<Event>> {
        let state = self.read_state()?;
        Ok(state.history.iter().rev().take(limit).cloned().collect())
    }

    /// Retained events of one topic, newest first
    pub fn history_for(&self, event_type: &str) -> Result<Vec<Event>> {
        let state = self.read_state()?;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect())
    }

    /// Retained events of one tenant, newest first
    pub fn history_for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Event>> {
        let state = self.read_state()?;
        Ok(state
            .history
            .iter()
            .rev()
            .filter(|e| &e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    pub fn clear_history(&self) -> Result<()> {
        self.write_state()?.history.clear();
        Ok(())
    }

    pub fn stats(&self) -> Result<BusStats> {
        let state = self.read_state()?;
        Ok(BusStats {
            published: state.published,
            delivered: state.delivered,
            failed: state.failed,
            subscribers: state.subscriptions.len(),
            history_len: state.history.len(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.read_state().map(|s| s.capacity).unwrap_or(0)
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, BusState>> {
        self.state.read().map_err(|_| GrcError::LockPoisoned("event bus"))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, BusState>> {
        self.state.write().map_err(|_| GrcError::LockPoisoned("event bus"))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_HISTORY)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("EventBus");
        if let Ok(state) = self.state.read() {
            d.field("capacity", &state.capacity)
                .field("subscribers", &state.subscriptions.len())
                .field("history_len", &state.history.len());
        }
        d.finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn event(event_type: &str) -> Event {
        Event::new(event_type, TenantId::new("acme"), "test").unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn EventHandler>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Arc<dyn EventHandler> = Arc::new(move |e: &Event| -> Result<()> {
            sink.lock().unwrap().push(e.event_type.clone());
            Ok(())
        });
        (seen, handler)
    }

    #[test]
    fn test_publish_to_matching_subscribers() {
        let bus = EventBus::default();
        let (risk_seen, risk_handler) = recorder();
        let (all_seen, all_handler) = recorder();

        bus.subscribe("risk", TopicPattern::new("risk.*").unwrap(), risk_handler)
            .unwrap();
        bus.subscribe("all", TopicPattern::any(), all_handler).unwrap();

        let report = bus.publish(event("risk.assessed")).unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 0);

        let report = bus.publish(event("evidence.collected")).unwrap();
        assert_eq!(report.delivered, 1);

        assert_eq!(*risk_seen.lock().unwrap(), vec!["risk.assessed"]);
        assert_eq!(
            *all_seen.lock().unwrap(),
            vec!["risk.assessed", "evidence.collected"]
        );
    }

    #[test]
    fn test_fan_out_in_subscription_order() {
        let bus = EventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(
                name,
                TopicPattern::any(),
                Arc::new(move |_: &Event| -> Result<()> {
                    order.lock().unwrap().push(name);
                    Ok(())
                }),
            )
            .unwrap();
        }

        bus.publish(event("x")).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_fan_out() {
        let bus = EventBus::default();
        let (seen, handler) = recorder();

        bus.subscribe(
            "broken",
            TopicPattern::any(),
            Arc::new(|_: &Event| -> Result<()> { Err(GrcError::validation("boom")) }),
        )
        .unwrap();
        bus.subscribe("ok", TopicPattern::any(), handler).unwrap();

        let report = bus.publish(event("x")).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(seen.lock().unwrap().len(), 1);

        let stats = bus.stats().unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.delivered, 1);
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let bus = EventBus::new(3);
        for i in 0..5 {
            bus.publish(event(&format!("e.{}", i))).unwrap();
        }

        let recent = bus.recent(10).unwrap();
        let types: Vec<_> = recent.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["e.4", "e.3", "e.2"]);
        assert_eq!(bus.stats().unwrap().published, 5);
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let bus = EventBus::default();
        assert_eq!(bus.capacity(), 50);
        for _ in 0..60 {
            bus.publish(event("tick")).unwrap();
        }
        assert_eq!(bus.stats().unwrap().history_len, 50);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::default();
        let (seen, handler) = recorder();
        let id = bus.subscribe("s", TopicPattern::any(), handler).unwrap();

        assert!(bus.unsubscribe(id).unwrap());
        assert!(!bus.unsubscribe(id).unwrap());

        bus.publish(event("x")).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    struct FailingSink;

    impl EventAuditSink for FailingSink {
        fn record_event(&self, _event: &Event) -> Result<()> {
            Err(GrcError::validation("audit store down"))
        }
    }

    #[test]
    fn test_audit_sink_failure_does_not_fail_publish() {
        let bus = EventBus::default();
        bus.set_audit_sink(Arc::new(FailingSink)).unwrap();

        let report = bus.publish(event("x")).unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(bus.recent(1).unwrap().len(), 1);
    }

    #[test]
    fn test_audit_sink_sees_every_event() {
        struct Counting(Mutex<usize>);
        impl EventAuditSink for Counting {
            fn record_event(&self, _event: &Event) -> Result<()> {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }

        let bus = EventBus::default();
        let sink = Arc::new(Counting(Mutex::new(0)));
        bus.set_audit_sink(sink.clone()).unwrap();

        bus.publish(event("a")).unwrap();
        bus.publish(event("b")).unwrap();
        assert_eq!(*sink.0.lock().unwrap(), 2);
    }

    #[test]
    fn test_handler_may_publish() {
        let bus = Arc::new(EventBus::default());
        let inner = Arc::clone(&bus);
        bus.subscribe(
            "relay",
            TopicPattern::new("first").unwrap(),
            Arc::new(move |e: &Event| -> Result<()> {
                inner
                    .publish(Event::new("second", e.tenant_id.clone(), "relay")?)
                    .map(|_| ())
            }),
        )
        .unwrap();

        bus.publish(event("first")).unwrap();
        assert_eq!(bus.history_for("second").unwrap().len(), 1);
    }

    #[test]
    fn test_history_filters() {
        let bus = EventBus::default();
        bus.publish(event("a")).unwrap();
        bus.publish(Event::new("a", TenantId::new("globex"), "test").unwrap())
            .unwrap();
        bus.publish(event("b")).unwrap();

        assert_eq!(bus.history_for("a").unwrap().len(), 2);
        assert_eq!(bus.history_for_tenant(&TenantId::new("acme")).unwrap().len(), 2);

        bus.clear_history().unwrap();
        assert!(bus.recent(10).unwrap().is_empty());
    }
}
