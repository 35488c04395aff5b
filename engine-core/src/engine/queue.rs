use crate::prelude::*;
use crossbeam::queue::ArrayQueue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// EngineEvent is the tagged sum of everything the matching worker can be
/// asked to do. Exactly one producer (the engine facade's submission path,
/// funneled through one inbound gateway) writes to the queue; the matching
/// worker is the sole consumer.
pub enum EngineEvent {
    NewOrder(Order),
    Cancel(OrderId),
    /// Explicit force-execute, used for testing.
    Execute(OrderId),
    MarketTick(Tick),
    TradeProduced(Trade),
    Shutdown,
}

/// Tick is one market-data update for a symbol.
#[derive(Clone, Debug)]
pub struct Tick {
    pub symbol: Arc<str>,
    pub bid: u128,
    pub ask: u128,
    pub last: u128,
    pub volume: u128,
    pub timestamp: u64,
}

/// A bounded, lock-free single-producer/single-consumer ring of
/// `EngineEvent`s. Lossless unless full: a push against a full queue
/// returns `EngineError::QueueFull` and never blocks or drops silently.
///
/// `crossbeam::queue::ArrayQueue` is itself safe for multiple producers;
/// this type's contract is narrower by convention (the engine wires exactly
/// one producer), matching the single-producer assumption baked into event
/// ordering guarantees elsewhere in this crate.
pub struct EventQueue {
    ring: ArrayQueue<EngineEvent>,
    shutting_down: AtomicBool,
}

impl EventQueue {
    /// `capacity` should be a power of two; non-power-of-two capacities
    /// still work but waste a little of the ring's addressable range.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: ArrayQueue::new(capacity),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Non-blocking push. Returns `EngineError::QueueFull` if the ring is at
    /// capacity; the caller decides whether to retry, drop, or backpressure
    /// upstream.
    pub fn try_push(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.ring.push(event).map_err(|_| EngineError::QueueFull)
    }

    /// Retries `try_push` until it succeeds or `timeout` elapses, at which
    /// point it returns `EngineError::Timeout`. Used by `submit_for`.
    pub fn push_for(&self, mut event: EngineEvent, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.ring.push(event) {
                Ok(()) => return Ok(()),
                Err(rejected) => {
                    event = rejected;
                    if Instant::now() >= deadline {
                        return Err(EngineError::Timeout);
                    }
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Pops the next event, if any, without blocking.
    pub fn try_pop(&self) -> Option<EngineEvent> {
        self.ring.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Requests cooperative shutdown: the worker drains whatever remains in
    /// the ring and then stops, rather than being torn down mid-event.
    pub fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        let _ = self.ring.push(EngineEvent::Shutdown);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}
