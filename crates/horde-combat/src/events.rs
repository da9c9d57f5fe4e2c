//! Event bus for combat notifications.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use horde_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::ChainReport;

/// Event types that can be sent through the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Enemy spawned
    EnemySpawned {
        /// Enemy id
        id: EntityId,
        /// Spawn position
        position: Vec2,
    },
    /// Enemy killed; the position is where its drops appear
    EnemyDied {
        /// Enemy id
        id: EntityId,
        /// Position at death
        position: Vec2,
    },
    /// Player lost hit points
    PlayerDamaged {
        /// Hit points left
        hp: i32,
        /// Maximum hit points
        max_hp: i32,
    },
    /// Player hit points reached zero
    PlayerDied,
    /// A hit knocked back more than one enemy
    KnockbackChained {
        /// The enemy that was hit
        primary: EntityId,
        /// Enemies that were knocked back with it
        secondary: Vec<EntityId>,
    },
}

/// Bounded queue of combat events, drained once per frame by the host.
///
/// Publishing never blocks the tick. When the queue is full the event is
/// dropped and counted; the first drop is logged as a warning.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<CombatEvent>,
    receiver: Receiver<CombatEvent>,
    capacity: usize,
    dropped: AtomicUsize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
            dropped: AtomicUsize::new(0),
        }
    }

    /// Queues an event. Returns `false` if it was dropped.
    pub fn publish(&self, event: CombatEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                let before = self.dropped.fetch_add(1, Ordering::Relaxed);
                if before == 0 {
                    warn!(capacity = self.capacity, "combat event bus full, dropping events");
                } else {
                    debug!(event = ?e.into_inner(), "combat event dropped");
                }
                false
            },
        }
    }

    /// Reports a chain knockback. Hits that moved only the primary are not
    /// published.
    pub fn publish_chain(&self, primary: EntityId, report: &ChainReport) -> bool {
        if report.chained.is_empty() {
            return false;
        }
        self.publish(CombatEvent::KnockbackChained {
            primary,
            secondary: report.chained_ids().collect(),
        })
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<CombatEvent> {
        self.receiver.try_iter().collect()
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

    /// Events dropped because the bus was full, since creation.
    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}
