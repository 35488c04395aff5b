use crate::prelude::*;
use std::sync::Arc;

/// ExecutionReport is emitted on every order status or fill change. It is
/// the single source of truth for "did my order go through"; a rejected
/// submission produces exactly one report and no further events for that
/// order id.
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    pub order_id: OrderId,
    pub external_id: String,
    pub symbol: Arc<str>,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub exec_price: Option<Price>,
    pub timestamp: u64,
    pub rejection_reason: Option<String>,
}

/// PositionSnapshot is published on every ledger update.
#[derive(Clone, Debug)]
pub struct PositionSnapshot {
    pub symbol: Arc<str>,
    pub quantity: i128,
    pub avg_cost: u128,
    pub realized_pnl: i128,
    pub last_update: u64,
}

/// EngineObserver is the outbound sink contract: a small registry of
/// polymorphic handlers, each invoked from the matching worker thread.
/// Implementations must be non-blocking, or must hand off work to their own
/// thread; an observer that blocks, blocks the entire matching worker.
///
/// Unexpected panics inside an observer callback are caught at the call
/// site and logged; engine state is never affected by an observer failure.
pub trait EngineObserver: Send + Sync {
    fn on_execution_report(&self, report: &ExecutionReport);
    fn on_trade(&self, trade: &Trade);
    fn on_position_update(&self, position: &PositionSnapshot);
}

/// NullObserver discards every notification; useful for tests and
/// benchmarks that don't care about the outbound stream.
pub struct NullObserver;

impl EngineObserver for NullObserver {
    fn on_execution_report(&self, _report: &ExecutionReport) {}
    fn on_trade(&self, _trade: &Trade) {}
    fn on_position_update(&self, _position: &PositionSnapshot) {}
}

/// ObserverRegistry fans a notification out to every registered observer,
/// catching and logging any panic so one misbehaving observer cannot take
/// down the worker or poison state for the others.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn EngineObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: Arc<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    pub fn notify_execution_report(&self, report: &ExecutionReport) {
        for observer in &self.observers {
            let observer = observer.clone();
            let report = report.clone();
            if let Err(panic) =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                    observer.on_execution_report(&report);
                }))
            {
                tracing::error!(?panic, "observer panicked handling execution report");
            }
        }
    }

    pub fn notify_trade(&self, trade: &Trade) {
        for observer in &self.observers {
            let observer = observer.clone();
            let trade = trade.clone();
            if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                observer.on_trade(&trade);
            })) {
                tracing::error!(?panic, "observer panicked handling trade");
            }
        }
    }

    pub fn notify_position_update(&self, position: &PositionSnapshot) {
        for observer in &self.observers {
            let observer = observer.clone();
            let position = position.clone();
            if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                observer.on_position_update(&position);
            })) {
                tracing::error!(?panic, "observer panicked handling position update");
            }
        }
    }
}
