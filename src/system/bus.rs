//! Gameplay event fan-out.
//!
//! The `EventBus` replaces global delegate lists: every interested party
//! (score aggregator, renderer, game-state machine) calls `subscribe()` and
//! drains its own channel on its own schedule.

use crate::logic::pool::TileHandle;
use crate::models::stats::Judgement;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Events published by the timing core.
#[derive(Debug, Clone, PartialEq)]
pub enum GameplayEvent {
    /// A tile was judged, by a tap or by its window closing.
    Judged {
        judgement: Judgement,
        lane: usize,
        /// `song_time - target_time` at judgement, in seconds.
        delta: f64,
    },
    /// The active difficulty profile changed.
    DifficultyChanged {
        index: usize,
        name: String,
        music_speed: f64,
    },
    /// A tile needs a visual.
    TileSpawned { handle: TileHandle, lane: usize },
    /// A tile's visual can be hidden; the handle is dead from now on.
    TileRetired { handle: TileHandle },
    /// A tile crossed the bottom boundary. Fatal for the run.
    FellThrough { lane: usize },
    /// Every note was played and the clock stopped.
    SongCompleted,
}

/// Publisher side of the gameplay channels.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GameplayEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<GameplayEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Sends `event` to every live subscriber.
    pub fn publish(&mut self, event: GameplayEvent) {
        // Unbounded sends only fail once the receiver is gone.
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_reaches_every_subscriber() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(GameplayEvent::SongCompleted);

        assert_eq!(a.try_recv(), Ok(GameplayEvent::SongCompleted));
        assert_eq!(b.try_recv(), Ok(GameplayEvent::SongCompleted));
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(GameplayEvent::FellThrough { lane: 2 });

        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(GameplayEvent::FellThrough { lane: 2 }));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let mut bus = EventBus::new();
        bus.publish(GameplayEvent::SongCompleted);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
