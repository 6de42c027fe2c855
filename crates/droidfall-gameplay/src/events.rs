//! Event bus carrying droid output to decoupled consumers.
//!
//! [`EventSender`] implements the audio and projectile contracts by
//! publishing onto the bus, so a host can collect everything a tick produced
//! and route it after the fact.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use droidfall_common::AgentId;

use crate::collaborators::{AudioCueSink, ProjectileFactory, ProjectileRequest};
use crate::cues::Cue;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A droid emitted an audio cue
    CueEmitted {
        /// Cue
        cue: Cue,
        /// Emitting droid
        agent: AgentId,
    },
    /// A droid asked for a projectile
    ProjectileRequested(ProjectileRequest),
    /// A droid's audio resources were released
    AudioReleased {
        /// Released droid
        agent: AgentId,
    },
}

/// Event bus for broadcasting simulation output.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<SimEvent>,
    /// Receiver for collecting events
    receiver: Receiver<SimEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    ///
    /// The bus never blocks. Events published while `capacity` events are
    /// pending are dropped with a warning, so the host must drain at least
    /// once per tick and size the bus for a tick's worth of output.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus, dropping it if the bus is full.
    pub fn publish(&self, event: SimEvent) {
        send(&self.sender, self.capacity, event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a publishing handle usable as a collaborator.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

/// Publishing handle of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<SimEvent>,
    capacity: usize,
}

impl EventSender {
    /// Publishes an event, dropping it if the bus is full.
    pub fn publish(&self, event: SimEvent) {
        send(&self.sender, self.capacity, event);
    }
}

fn send(sender: &Sender<SimEvent>, capacity: usize, event: SimEvent) {
    match sender.try_send(event) {
        Ok(()) => {},
        Err(TrySendError::Full(event)) => {
            warn!(capacity, ?event, "event bus full, event dropped");
        },
        Err(TrySendError::Disconnected(event)) => {
            trace!(?event, "event bus closed, event dropped");
        },
    }
}

impl AudioCueSink for EventSender {
    fn emit_cue(&mut self, cue: Cue, agent: AgentId) {
        self.publish(SimEvent::CueEmitted { cue, agent });
    }

    fn release(&mut self, agent: AgentId) -> Result<(), droidfall_common::TeardownError> {
        self.publish(SimEvent::AudioReleased { agent });
        Ok(())
    }
}

impl ProjectileFactory for EventSender {
    fn spawn(&mut self, request: ProjectileRequest) {
        self.publish(SimEvent::ProjectileRequested(request));
    }
}
