use thiserror::Error;

/// Errors raised by the order book when a cancel cannot be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOrderError {
    /// The order id is unknown to this book.
    OrderNotFound,
    /// The order is no longer cancelable (already terminal or mid-match).
    OrderNotCancellable,
}

/// The full error taxonomy surfaced across the engine facade. Kinds, not
/// exception types: every fallible operation in this crate returns one of
/// these through `Result`, never panics on a caller-reachable path.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A well-formedness failure in the caller's request: caller bug.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The pre-trade risk validator rejected the order; the reason string
    /// is the validator's own human-readable explanation.
    #[error("risk rejection: {0}")]
    RiskRejection(String),

    /// The referenced order id is unknown.
    #[error("order not found: {0}")]
    NotFound(u64),

    /// The order is in a terminal or mid-match state and cannot be canceled.
    #[error("order not cancelable: {0}")]
    NotCancelable(u64),

    /// The requested status mutation violates the legal transition matrix.
    #[error("invalid transition for order {order_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        order_id: u64,
        from: crate::engine::types::OrderStatus,
        to: crate::engine::types::OrderStatus,
    },

    /// A fill would have pushed `filled` past `requested`.
    #[error("overfill on order {order_id}: filled {filled} + {attempted} > requested {requested}")]
    OverFill {
        order_id: u64,
        filled: u128,
        attempted: u128,
        requested: u128,
    },

    /// The event queue is at capacity; the caller's event was not enqueued.
    #[error("queue full")]
    QueueFull,

    /// A caller asked for something the engine is momentarily unable to do
    /// (distinct from `QueueFull` when the cause isn't backpressure).
    #[error("engine busy")]
    Busy,

    /// A timed operation (e.g. `submit_for`) expired before it completed.
    #[error("operation timed out")]
    Timeout,

    /// `modify` is never supported; callers must cancel and resubmit.
    #[error("modify is not supported; cancel and resubmit")]
    ModifyUnsupported,

    /// A persistence call failed. Never fatal: in-memory state remains
    /// authoritative and this is logged, not propagated as a hard failure.
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    /// An internal invariant was violated. In debug builds this may be
    /// paired with a `debug_assert!`; in release builds it is logged and
    /// surfaces through a health-degraded flag, never a panic.
    #[error("internal error: {0}")]
    Internal(String),
}
