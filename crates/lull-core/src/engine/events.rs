//! Engine events
//!
//! Published whenever playback changes so a front-end can redraw without
//! polling. Delivery is best effort: a subscriber whose queue is full misses
//! new events until it catches up.

use std::sync::{Arc, Mutex};

use crossbeam::channel::{Receiver, Sender, TrySendError};

use super::error::EngineError;
use crate::catalog::SoundId;

/// Playback changes reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A channel began looping
    ChannelStarted { id: SoundId },
    /// A channel stopped (its position is kept)
    ChannelStopped { id: SoundId },
    /// A channel could not be started
    ChannelFailed { id: SoundId, error: EngineError },
    /// The master play/pause gate changed
    MasterChanged { playing: bool },
}

/// Fan-out of engine events to bounded per-subscriber queues
///
/// Every subscriber sees every event published after it subscribed.
#[derive(Clone)]
pub struct EventBus {
    capacity: usize,
    subscribers: Arc<Mutex<Vec<Sender<EngineEvent>>>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (sender, receiver) = crossbeam::channel::bounded(self.capacity);
        self.subscribers.lock().unwrap().push(sender);
        receiver
    }

    /// Publish without blocking; dropped subscribers are forgotten
    pub fn publish(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::debug!("EventBus: subscriber queue full, dropping {:?}", event);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_receive() {
        let bus = EventBus::new(4);
        let rx = bus.subscribe();

        bus.publish(EngineEvent::ChannelStarted { id: SoundId::Rain });
        bus.publish(EngineEvent::MasterChanged { playing: true });

        assert_eq!(rx.recv().unwrap(), EngineEvent::ChannelStarted { id: SoundId::Rain });
        assert_eq!(rx.recv().unwrap(), EngineEvent::MasterChanged { playing: true });
    }

    #[test]
    fn test_full_bus_never_blocks() {
        let bus = EventBus::new(1);
        let rx = bus.subscribe();

        bus.publish(EngineEvent::ChannelStopped { id: SoundId::Fire });
        bus.publish(EngineEvent::ChannelStopped { id: SoundId::Wind });

        assert_eq!(rx.try_recv().unwrap(), EngineEvent::ChannelStopped { id: SoundId::Fire });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_events_before_subscribe_are_not_queued() {
        let bus = EventBus::new(4);
        bus.publish(EngineEvent::MasterChanged { playing: true });

        let rx = bus.subscribe();
        assert!(rx.try_recv().is_err());

        bus.publish(EngineEvent::MasterChanged { playing: false });
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::MasterChanged { playing: false });
    }

    #[test]
    fn test_every_subscriber_sees_every_event() {
        let bus = EventBus::new(4);
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(EngineEvent::ChannelStarted { id: SoundId::Cat });

        assert_eq!(a.try_recv().unwrap(), EngineEvent::ChannelStarted { id: SoundId::Cat });
        assert_eq!(b.try_recv().unwrap(), EngineEvent::ChannelStarted { id: SoundId::Cat });
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let bus = EventBus::new(4);
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EngineEvent::ChannelStopped { id: SoundId::Rain });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(kept.try_recv().is_ok());
    }
}
