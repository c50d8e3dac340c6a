// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Knowledge store and planner publish here; the CLI and tests subscribe.
//
// In-memory only: events are lost on restart. The manifest on disk is the
// durable record.

use crate::domain::events::{PlanningEvent, StoreEvent};
use crate::domain::planning::PlanningRequestId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Store(StoreEvent),
    Planning(PlanningEvent),
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_store_event(&self, event: StoreEvent) {
        self.publish(DomainEvent::Store(event));
    }

    pub fn publish_planning_event(&self, event: PlanningEvent) {
        self.publish(DomainEvent::Planning(event));
    }

    /// Publish a domain event to all subscribers. Never fails.
    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        // send() errs only when there are no receivers
        let receiver_count = self.sender.send(event).unwrap_or(0);

        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        let receiver = self.sender.subscribe();
        EventReceiver { receiver }
    }

    /// Subscribe to the planning events of a single request
    pub fn subscribe_planning(&self, request_id: PlanningRequestId) -> PlanningEventReceiver {
        let receiver = self.sender.subscribe();
        PlanningEventReceiver {
            receiver,
            request_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until an event is available)
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Drain everything currently buffered
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

/// Receiver for the planning events of one request (filtered)
pub struct PlanningEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    request_id: PlanningRequestId,
}

impl PlanningEventReceiver {
    /// Receive the next planning event for the subscribed request.
    /// Events from other requests and store events are skipped.
    pub async fn recv(&mut self) -> Result<PlanningEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if let DomainEvent::Planning(planning_event) = event {
                if request_id_of(&planning_event) == self.request_id {
                    return Ok(planning_event);
                }
            }
        }
    }
}

fn request_id_of(event: &PlanningEvent) -> PlanningRequestId {
    match event {
        PlanningEvent::PlanningStarted { request_id, .. }
        | PlanningEvent::PolicyCorrectionApplied { request_id, .. }
        | PlanningEvent::CycleDetected { request_id, .. }
        | PlanningEvent::CycleRepaired { request_id, .. }
        | PlanningEvent::PlanningCompleted { request_id, .. }
        | PlanningEvent::PlanningFailed { request_id, .. } => *request_id,
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
