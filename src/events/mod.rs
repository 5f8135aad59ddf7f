use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ServiceError;

/// Event name raised when a supplier is created.
pub const SUPPLIER_CREATED: &str = "SupplierCreated";
/// Event name raised when a supplier is updated.
pub const SUPPLIER_UPDATED: &str = "SupplierUpdated";

/// Immutable record of something that happened to an aggregate.
///
/// Command handlers return these alongside their result; the command bus hands
/// them to the event bus once the handler has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub aggregate_id: String,
    pub event_name: String,
    pub occurred_on: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(aggregate_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            aggregate_id: aggregate_id.into(),
            event_name: event_name.into(),
            occurred_on: Utc::now(),
        }
    }
}

/// A subscriber to domain events.
///
/// Listener failures are not swallowed: an error returned here propagates to
/// whoever triggered the publish and aborts the remaining listeners of that
/// dispatch.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn handle(&self, event: &DomainEvent) -> Result<(), ServiceError>;
}

/// In-process event bus mapping event names to ordered listener lists.
///
/// Registration mutates through `&mut self` and is expected to finish before
/// the bus is shared behind an `Arc`; dispatch only needs `&self`.
pub struct EventBus {
    listeners: HashMap<String, Vec<Arc<dyn EventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Appends a listener for the given event name. The same listener may be
    /// registered under several names.
    pub fn register(&mut self, event_name: impl Into<String>, listener: Arc<dyn EventListener>) {
        let event_name = event_name.into();
        debug!(event_name = %event_name, "registering event listener");
        self.listeners.entry(event_name).or_default().push(listener);
    }

    /// Removes the given listener from the given event name. Identity is
    /// pointer identity over the `Arc`; other names keep the listener.
    pub fn unregister(&mut self, event_name: &str, listener: &Arc<dyn EventListener>) {
        if let Some(registered) = self.listeners.get_mut(event_name) {
            registered.retain(|candidate| !Arc::ptr_eq(candidate, listener));
            if registered.is_empty() {
                self.listeners.remove(event_name);
            }
        }
    }

    /// Invokes every listener registered for the event's name, in registration
    /// order, awaiting each before the next. No listeners is a silent no-op.
    pub async fn publish(&self, event: &DomainEvent) -> Result<(), ServiceError> {
        let Some(registered) = self.listeners.get(&event.event_name) else {
            return Ok(());
        };

        info!(
            event_name = %event.event_name,
            aggregate_id = %event.aggregate_id,
            listeners = registered.len(),
            "publishing domain event"
        );
        for listener in registered {
            listener.handle(event).await?;
        }
        Ok(())
    }

    /// Publishes a batch of events sequentially in slice order.
    pub async fn publish_all(&self, events: &[DomainEvent]) -> Result<(), ServiceError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener that writes supplier events to the log. Registered for both
/// supplier event names during service wiring.
pub struct SupplierEventLogger;

#[async_trait]
impl EventListener for SupplierEventLogger {
    async fn handle(&self, event: &DomainEvent) -> Result<(), ServiceError> {
        info!(
            event_name = %event.event_name,
            aggregate_id = %event.aggregate_id,
            occurred_on = %event.occurred_on.to_rfc3339(),
            "supplier event"
        );
        crate::metrics::increment_counter("supplier_events_total");
        Ok(())
    }
}
