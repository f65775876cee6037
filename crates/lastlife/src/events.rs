//! # Lifecycle Events
//!
//! Notifications published after each lifecycle transition, for the chat
//! and Discord relays (and anything else that wants to watch).
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │  Lifecycle   │─────>│   Event     │─────>│  Chat relay  │
//! │   Engine     │      │   Channel   │      │ Discord relay│
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! Every subscriber gets its own bounded channel and a copy of every event
//! published after it subscribed. A full subscriber drops the event and
//! logs; the engine never blocks on a slow consumer. Dropping an
//! [`EventReceiver`] unsubscribes it.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use lastlife_shared::{Location, PlayerId};
use parking_lot::Mutex;

use crate::record::{ReviveOptions, ReviveResult};

/// Default per-subscriber channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A completed lifecycle transition.
#[derive(Clone, Debug, PartialEq)]
pub enum LifecycleEvent {
    /// A punitive death: inventory captured, player banned.
    DeathBanned {
        /// Who died.
        player: PlayerId,
        /// Display name.
        name: String,
        /// Where.
        location: Location,
        /// Ban reason shown to the player.
        reason: String,
    },

    /// An administrator queued a revive.
    ReviveRequested {
        /// Who will be revived.
        player: PlayerId,
        /// Display name.
        name: String,
        /// What the revive will do.
        options: ReviveOptions,
    },

    /// A revive ran (successfully or vetoed).
    Revived {
        /// Who.
        player: PlayerId,
        /// Display name.
        name: String,
        /// Outcome.
        result: ReviveResult,
    },

    /// The last successful revive was undone.
    ReviveUndone {
        /// Who.
        player: PlayerId,
        /// Display name.
        name: String,
    },
}

impl LifecycleEvent {
    /// The player the event is about.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        match self {
            Self::DeathBanned { player, .. }
            | Self::ReviveRequested { player, .. }
            | Self::Revived { player, .. }
            | Self::ReviveUndone { player, .. } => *player,
        }
    }
}

/// Fan-out of lifecycle events to any number of subscribers.
pub struct EventBus {
    capacity: usize,
    subscribers: Mutex<Vec<Sender<LifecycleEvent>>>,
}

impl EventBus {
    /// Creates a bus whose subscribers each buffer at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber.
    ///
    /// Only events published after this call are delivered to it.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.lock().push(sender);
        EventReceiver { receiver }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Publishes an event to every subscriber without blocking.
    ///
    /// Returns how many subscribers received it. Subscribers whose receiver
    /// was dropped are removed.
    pub fn publish(&self, event: &LifecycleEvent) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(player = %event.player(), "subscriber channel full, dropping lifecycle event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        delivered
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// One subscriber's queue of events.
pub struct EventReceiver {
    receiver: Receiver<LifecycleEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<LifecycleEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<LifecycleEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undone(player: PlayerId) -> LifecycleEvent {
        LifecycleEvent::ReviveUndone {
            player,
            name: "Alex".to_owned(),
        }
    }

    #[test]
    fn test_event_send_receive() {
        let bus = EventBus::new(8);
        let receiver = bus.subscribe();
        let id = PlayerId::random();

        assert_eq!(bus.publish(&undone(id)), 1);
        assert!(receiver.has_events());
        assert_eq!(receiver.try_recv().unwrap().player(), id);
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let chat = bus.subscribe();
        let discord = bus.subscribe();
        for _ in 0..4 {
            assert_eq!(bus.publish(&undone(PlayerId::random())), 2);
        }
        let chat_events = chat.drain();
        assert_eq!(chat_events.len(), 4);
        assert_eq!(discord.drain(), chat_events);
    }

    #[test]
    fn test_no_subscribers_buffers_nothing() {
        let bus = EventBus::new(4);
        for _ in 0..10 {
            assert_eq!(bus.publish(&undone(PlayerId::random())), 0);
        }
        let late = bus.subscribe();
        assert_eq!(late.pending_count(), 0);

        let id = PlayerId::random();
        bus.publish(&undone(id));
        assert_eq!(late.drain(), vec![undone(id)]);
    }

    #[test]
    fn test_dropped_receiver_unsubscribes() {
        let bus = EventBus::new(4);
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(&undone(PlayerId::random())), 1);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.pending_count(), 1);
    }

    #[test]
    fn test_full_subscriber_does_not_starve_others() {
        let bus = EventBus::new(2);
        let slow = bus.subscribe();
        let fast = bus.subscribe();
        let id = PlayerId::random();

        assert_eq!(bus.publish(&undone(id)), 2);
        assert_eq!(bus.publish(&undone(id)), 2);
        fast.drain();
        assert_eq!(bus.publish(&undone(id)), 1);

        assert_eq!(slow.pending_count(), 2);
        assert_eq!(fast.pending_count(), 1);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_drain() {
        let bus = EventBus::default();
        let receiver = bus.subscribe();
        for _ in 0..5 {
            bus.publish(&undone(PlayerId::random()));
        }
        assert_eq!(receiver.drain().len(), 5);
        assert_eq!(receiver.pending_count(), 0);
    }
}
