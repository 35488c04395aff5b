use crate::engine::config::TickRounding;
use crypto_bigint::U256;
use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// OrderId is the internal handle used by the book and the order index.
/// The externally-visible identifier returned from `submit` is a formatted
/// string built from this handle (see `format_order_id`); the numeric form
/// is kept as the book/index key since the skiplist and the concurrent
/// index are both ordered/hashed on it.
pub type OrderId = u64;

/// TradeId is a strictly monotone identifier assigned by the matching worker.
pub type TradeId = u64;

/// Price is a 256-bit unsigned fixed-point integer: no floating point ever
/// touches a monetary quantity in this crate.
pub type Price = U256;

/// Quantity is likewise a 256-bit unsigned integer.
pub type Quantity = U256;

/// Priority determines order position within a price level: earlier orders
/// (lower priority values) are consumed first.
pub type Priority = u64;

/// Converts a `Price`/`Quantity` to `u128` for ledger arithmetic.
///
/// The book and matching engine operate on `U256` for tick-exact ordering
/// and comparisons, which is all that layer ever needs. The position ledger
/// needs signed arithmetic (a position can be negative) and multiplication/
/// division for average-cost and P&L math, neither of which `U256` is suited
/// for without a dedicated bignum division routine. Real price and quantity
/// magnitudes in this domain fit comfortably in 128 bits, so the ledger
/// layer narrows once at its boundary instead of carrying `U256` all the way
/// through P&L arithmetic.
pub fn narrow_to_u128(value: U256) -> u128 {
    let words = value.as_words();
    let lo = words[0] as u128;
    let hi = words[1] as u128;
    lo | (hi << 64)
}

/// Widens a `u128` back into a `Price`/`Quantity`.
pub fn widen_from_u128(value: u128) -> U256 {
    U256::from(value)
}

/// Side indicates the direction of the order.
#[derive(PartialEq, Eq, Default, Copy, Clone, Debug)]
pub enum Side {
    /// Buy means the user wants to acquire the asset, typically matching against sell orders.
    #[default]
    Buy,
    /// Sell means the user wants to sell the asset, typically matching against buy orders.
    Sell,
}

impl Side {
    /// The signed multiplier applied to a traded quantity when folding it into a position.
    pub fn sign(self) -> i128 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// OrderType determines how the order will be executed. This system models
/// only the two order types observed in the source it is based on; there is
/// no fill-or-kill, immediate-or-cancel, or time-in-force qualifier here.
#[derive(PartialEq, Eq, Default, Copy, Clone, Debug)]
pub enum OrderType {
    /// Limit orders specify a maximum (for buy) or minimum (for sell) price and can rest on the book.
    #[default]
    Limit,
    /// Market orders do not specify a price and are filled immediately against the best available prices.
    Market,
}

/// OrderStatus represents the current status of an order during its lifecycle.
/// The only legal mutations of this field are the transitions enumerated by
/// `OrderStatus::can_transition_to`.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum OrderStatus {
    /// The order has been submitted but not yet accepted into the book.
    #[default]
    New,
    /// The order passed risk checks and is resting or eligible for matching.
    Accepted,
    /// The order was partially filled; the remainder is still working.
    PartiallyFilled,
    /// The order was fully filled.
    Filled,
    /// The order was canceled before being fully filled.
    Canceled,
    /// The order was rejected and never entered the book.
    Rejected,
}

impl OrderStatus {
    /// Whether no further transition is possible out of this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }

    /// The legal transition matrix. This is the only function allowed to
    /// authorize a status mutation; any caller attempting to move an order
    /// outside of what this returns `true` for must fail with
    /// `EngineError::InvalidTransition` and leave the order unchanged.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (New, Accepted) | (New, Rejected) => true,
            (Accepted, PartiallyFilled)
            | (Accepted, Filled)
            | (Accepted, Canceled)
            | (Accepted, Rejected) => true,
            (PartiallyFilled, PartiallyFilled)
            | (PartiallyFilled, Filled)
            | (PartiallyFilled, Canceled) => true,
            _ => false,
        }
    }
}

/// Represents the lifecycle state of an order used to coordinate safe
/// concurrent access between the single matching worker and cancel
/// requests arriving on the same order id.
///
/// The transitions are:
/// - `Active` -> `Matched` (the worker claims the order for a peel)
/// - `Active` -> `Finished` (cancel removes the order)
/// - `Matched` -> `Active` (the worker releases the order after a partial fill)
/// - `Matched` -> `Finished` (the worker completes the order)
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum OrderLifecycle {
    /// The order is live and can be matched or canceled.
    #[default]
    Active = 0,
    /// The order is currently being matched and cannot be canceled.
    Matched = 1,
    /// The order has finished matching and can be removed from the book.
    Finished = 2,
}

impl From<u8> for OrderLifecycle {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Active,
            1 => Self::Matched,
            2 => Self::Finished,
            _ => unreachable!("invalid lifecycle state"),
        }
    }
}

impl From<OrderLifecycle> for u8 {
    fn from(l: OrderLifecycle) -> u8 {
        l as u8
    }
}

/// CancelReason records why a cancel transition happened.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum CancelReason {
    /// An external caller requested the cancel.
    #[default]
    UserRequest,
    /// A market order's unfilled residue was canceled after the book was exhausted.
    InsufficientLiquidity,
}

/// TradeRole represents the role of the order in a matched trade. Each peel
/// produces one trade per side: the resting order is the maker, the
/// incoming order is the taker.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum TradeRole {
    /// Maker was already resting in the book and provided liquidity.
    #[default]
    Maker,
    /// Taker was the incoming order that removed liquidity.
    Taker,
}

/// FillKind distinguishes a trade that fully closed an order's remaining
/// quantity from one that left a working residue.
#[derive(PartialEq, Eq, Default, Clone, Copy, Debug)]
pub enum FillKind {
    #[default]
    Partial,
    Full,
}

/// BookKey is the composite key an order occupies inside one side's skip
/// list. It combines price and arrival priority; the side determines the
/// direction of the price ordering.
///
/// - For Buy orders: higher prices sort first, then earlier priority.
/// - For Sell orders: lower prices sort first, then earlier priority.
///
/// A single skip list per side is therefore enough to encode price-time
/// priority without a secondary per-level structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookKey {
    pub price: Price,
    pub priority: Priority,
    pub side: Side,
}

impl Ord for BookKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.side {
            Side::Buy => self
                .price
                .cmp(&other.price)
                .reverse()
                .then(self.priority.cmp(&other.priority)),
            Side::Sell => self
                .price
                .cmp(&other.price)
                .then(self.priority.cmp(&other.priority)),
        }
    }
}

impl PartialOrd for BookKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// `Order` is a single order resting in or passing through the book.
///
/// Fields mutated during matching (`status`, `quantity`, `filled_quantity`,
/// `total_fill_value`, `cancel_reason`, `rejection_reason`) are wrapped in
/// `UnsafeCell` to allow interior mutation through a shared reference.
///
/// SAFETY: every mutation is performed by the single matching worker thread
/// after it has claimed the order via `OrderLifecycle`'s compare-and-swap
/// transitions (`enter_matched`, `enter_finished_from_active`, ...). No two
/// threads ever hold a claim on the same order at once, so the shared
/// mutation below never races.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Arc<str>,
    pub side: Side,
    pub lifecycle: AtomicU8,
    pub order_type: OrderType,
    pub status: UnsafeCell<OrderStatus>,
    pub price: Price,
    pub requested_quantity: Quantity,
    pub quantity: UnsafeCell<Quantity>,
    pub filled_quantity: UnsafeCell<Quantity>,
    pub total_fill_value: UnsafeCell<u128>,
    pub cancel_reason: UnsafeCell<Option<CancelReason>>,
    pub rejection_reason: UnsafeCell<Option<String>>,
    pub created_at: u64,
    pub updated_at: u64,
}

unsafe impl Sync for Order {}

impl Default for Order {
    fn default() -> Self {
        Order {
            id: 0,
            symbol: Arc::from(""),
            side: Side::default(),
            lifecycle: AtomicU8::new(OrderLifecycle::Active.into()),
            order_type: OrderType::default(),
            status: UnsafeCell::new(OrderStatus::default()),
            price: U256::ZERO,
            requested_quantity: U256::ZERO,
            quantity: UnsafeCell::new(U256::ZERO),
            filled_quantity: UnsafeCell::new(U256::ZERO),
            total_fill_value: UnsafeCell::new(0),
            cancel_reason: UnsafeCell::new(None),
            rejection_reason: UnsafeCell::new(None),
            created_at: 0,
            updated_at: 0,
        }
    }
}

impl Clone for Order {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            symbol: self.symbol.clone(),
            side: self.side,
            lifecycle: AtomicU8::new(self.lifecycle.load(Ordering::Acquire).into()),
            order_type: self.order_type,
            status: UnsafeCell::new(unsafe { *self.status.get() }),
            price: self.price,
            requested_quantity: self.requested_quantity,
            quantity: UnsafeCell::new(unsafe { *self.quantity.get() }),
            filled_quantity: UnsafeCell::new(unsafe { *self.filled_quantity.get() }),
            total_fill_value: UnsafeCell::new(unsafe { *self.total_fill_value.get() }),
            cancel_reason: UnsafeCell::new(unsafe { *self.cancel_reason.get() }),
            rejection_reason: UnsafeCell::new(unsafe { (*self.rejection_reason.get()).clone() }),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Order {
    #[inline(always)]
    pub fn status(&self) -> OrderStatus {
        unsafe { *self.status.get() }
    }

    #[inline(always)]
    pub fn is_filled(&self) -> bool {
        self.status() == OrderStatus::Filled
    }

    #[inline(always)]
    pub fn quantity(&self) -> Quantity {
        unsafe { *self.quantity.get() }
    }

    #[inline(always)]
    pub fn filled_quantity(&self) -> Quantity {
        unsafe { *self.filled_quantity.get() }
    }

    #[inline(always)]
    pub fn total_fill_value(&self) -> u128 {
        unsafe { *self.total_fill_value.get() }
    }

    #[inline(always)]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        unsafe { *self.cancel_reason.get() }
    }

    #[inline(always)]
    pub fn rejection_reason(&self) -> Option<String> {
        unsafe { (*self.rejection_reason.get()).clone() }
    }

    /// Average fill price, or `None` while nothing has filled yet.
    pub fn average_fill_price(&self) -> Option<u128> {
        let filled = narrow_to_u128(self.filled_quantity());
        if filled == 0 {
            return None;
        }
        Some(self.total_fill_value() / filled)
    }

    #[inline(always)]
    pub fn book_key(&self) -> BookKey {
        BookKey {
            price: self.price,
            priority: self.priority(),
            side: self.side,
        }
    }

    #[inline(always)]
    pub(crate) fn reset_lifecycle(&self) {
        self.lifecycle
            .store(OrderLifecycle::Active.into(), Ordering::Release);
    }

    #[inline(always)]
    pub(crate) fn enter_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Active.into(),
                OrderLifecycle::Matched.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn exit_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Matched.into(),
                OrderLifecycle::Active.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn enter_finished_from_active(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Active.into(),
                OrderLifecycle::Finished.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    #[inline(always)]
    pub(crate) fn enter_finished_from_matched(&self) -> bool {
        self.lifecycle
            .compare_exchange_weak(
                OrderLifecycle::Matched.into(),
                OrderLifecycle::Finished.into(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// The order's priority within its book side. Earlier orders sort first.
    #[inline(always)]
    pub(crate) fn priority(&self) -> Priority {
        self.updated_at * 100 + self.id % 100
    }

    /// Applies one peel's worth of fill. Only ever called by the matching
    /// worker while the order is claimed via `enter_matched`.
    #[inline(always)]
    pub(crate) fn apply_fill(&self, traded_qty: Quantity, traded_price: Price) -> Quantity {
        unsafe {
            *self.quantity.get() -= traded_qty;
            *self.filled_quantity.get() += traded_qty;
            *self.total_fill_value.get() +=
                narrow_to_u128(traded_qty) * narrow_to_u128(traded_price);
            *self.quantity.get()
        }
    }

    /// Attempts a status transition, enforcing the legal transition matrix.
    /// Returns `false` and leaves the order unchanged if the transition is
    /// not legal from the order's current status.
    #[inline(always)]
    pub(crate) fn try_transition(&self, next: OrderStatus) -> bool {
        let current = self.status();
        if !current.can_transition_to(next) {
            return false;
        }
        unsafe {
            *self.status.get() = next;
        }
        true
    }

    #[inline(always)]
    pub(crate) fn update_cancel_reason(&self, reason: CancelReason) {
        unsafe {
            *self.cancel_reason.get() = Some(reason);
        }
    }

    #[inline(always)]
    pub(crate) fn update_rejection_reason(&self, reason: String) {
        unsafe {
            *self.rejection_reason.get() = Some(reason);
        }
    }

    /// Clones the order and resets its lifecycle to `Active`, used when
    /// publishing a post-peel snapshot of an order that remains working.
    pub(crate) fn clone_reset_lifecycle(&self) -> Self {
        let cloned = self.clone();
        cloned.reset_lifecycle();
        cloned
    }
}

/// Trade represents one executed peel, attributed to one side of the cross.
/// Each peel produces a maker/taker pair sharing the same quantity, price,
/// and timestamp but distinct trade ids and order ids.
#[derive(Clone, Debug)]
pub struct Trade {
    pub id: TradeId,
    pub role: TradeRole,
    pub order_id: OrderId,
    pub symbol: Arc<str>,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub fill_kind: FillKind,
    pub created_at: u64,
}

impl Trade {
    const COMMISSION_RATE_PPM: u128 = 1_000; // 0.1% expressed as parts-per-million
    const MIN_COMMISSION: u128 = 1;

    pub fn notional(&self) -> u128 {
        narrow_to_u128(self.quantity) * narrow_to_u128(self.price)
    }

    pub fn commission(&self) -> u128 {
        let rated = self.notional() * Self::COMMISSION_RATE_PPM / 1_000_000;
        rated.max(Self::MIN_COMMISSION)
    }

    pub fn net_value(&self) -> u128 {
        self.notional().saturating_sub(self.commission())
    }

    /// Computes the quantity peeled from crossing `taker` against `maker`,
    /// applies the fill to both orders, and returns the maker/taker trade
    /// pair attributed to the peel (or `None` if there was nothing to
    /// trade). The execution price is always the resting (maker) order's
    /// price.
    #[inline(always)]
    pub(crate) fn matched(
        trade_id_seq: &mut dyn FnMut() -> TradeId,
        now_micros: u64,
        taker: &Order,
        maker: &Order,
    ) -> Option<(Trade, Trade)> {
        use crypto_bigint::Zero;

        let maker_qty_before = maker.quantity();
        let taker_qty_before = taker.quantity();
        let traded_quantity = taker_qty_before.min(maker_qty_before);
        if bool::from(traded_quantity.is_zero()) {
            return None;
        }

        let maker_qty_after = maker.apply_fill(traded_quantity, maker.price);
        let taker_qty_after = taker.apply_fill(traded_quantity, maker.price);

        let maker_kind = if bool::from(maker_qty_after.is_zero()) {
            FillKind::Full
        } else {
            FillKind::Partial
        };
        let taker_kind = if bool::from(taker_qty_after.is_zero()) {
            FillKind::Full
        } else {
            FillKind::Partial
        };

        let maker_status = match maker_kind {
            FillKind::Full => OrderStatus::Filled,
            FillKind::Partial => OrderStatus::PartiallyFilled,
        };
        let taker_status = match taker_kind {
            FillKind::Full => OrderStatus::Filled,
            FillKind::Partial => OrderStatus::PartiallyFilled,
        };
        maker.try_transition(maker_status);
        taker.try_transition(taker_status);

        let maker_trade = Trade {
            id: trade_id_seq(),
            role: TradeRole::Maker,
            order_id: maker.id,
            symbol: maker.symbol.clone(),
            side: maker.side,
            price: maker.price,
            quantity: traded_quantity,
            fill_kind: maker_kind,
            created_at: now_micros,
        };
        let taker_trade = Trade {
            id: trade_id_seq(),
            role: TradeRole::Taker,
            order_id: taker.id,
            symbol: taker.symbol.clone(),
            side: taker.side,
            price: maker.price,
            quantity: traded_quantity,
            fill_kind: taker_kind,
            created_at: now_micros,
        };

        Some((maker_trade, taker_trade))
    }
}

/// OrderRequest is the caller-supplied input to `submit`; it is consumed on
/// validation and never retained past the resulting `Order` or rejection.
#[derive(Clone, Debug)]
pub struct OrderRequest {
    pub symbol: Arc<str>,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Price,
    pub submitted_at: u64,
}

/// Instrument metadata: tick/lot grid and the latest observed market data.
#[derive(Clone, Debug)]
pub struct Instrument {
    pub symbol: Arc<str>,
    pub tick_size: u128,
    pub lot_size: u128,
    pub active: bool,
    pub bid: Option<u128>,
    pub ask: Option<u128>,
    pub last: Option<u128>,
    pub last_update: u64,
}

impl Instrument {
    pub fn new(symbol: impl Into<Arc<str>>, tick_size: u128, lot_size: u128) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            lot_size: lot_size.max(1),
            active: true,
            bid: None,
            ask: None,
            last: None,
            last_update: 0,
        }
    }

    /// Rounds a price to the instrument's tick grid per `rounding`, applied
    /// on order acceptance. `NearestEven` rounds to the closest tick,
    /// breaking exact ties to the even tick (banker's rounding); `Down`
    /// always floors to the tick at or below; `Up` always ceils to the
    /// tick at or above.
    pub fn round_to_tick(&self, price: u128, rounding: TickRounding) -> u128 {
        if self.tick_size == 0 {
            return price;
        }
        let ticks = price / self.tick_size;
        let remainder = price % self.tick_size;
        if remainder == 0 {
            return price;
        }
        let rounded_ticks = match rounding {
            TickRounding::Down => ticks,
            TickRounding::Up => ticks + 1,
            TickRounding::NearestEven => {
                let half = self.tick_size / 2;
                match remainder.cmp(&half) {
                    std::cmp::Ordering::Less => ticks,
                    std::cmp::Ordering::Greater => ticks + 1,
                    std::cmp::Ordering::Equal => {
                        if ticks % 2 == 0 { ticks } else { ticks + 1 }
                    }
                }
            }
        };
        rounded_ticks * self.tick_size
    }

    pub fn round_to_lot(&self, quantity: u128) -> u128 {
        if self.lot_size == 0 {
            return quantity;
        }
        (quantity / self.lot_size) * self.lot_size
    }

    pub fn mid_price(&self) -> Option<u128> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((a + b) / 2),
            _ => None,
        }
    }

    pub fn is_stale(&self, now: u64, stale_threshold_ms: u64) -> bool {
        now.saturating_sub(self.last_update) > stale_threshold_ms
    }
}

/// LimitKind enumerates the kinds of risk limit the validator enforces.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum LimitKind {
    MaxOrderSize,
    MaxPositionSize,
    MaxDailyVolume,
    MaxDailyLoss,
}

/// RiskLimit is one cap, either global (`symbol` is `None`) or scoped to a
/// single symbol. At most one active limit exists per `(symbol, kind)` pair.
#[derive(Clone, Debug)]
pub struct RiskLimit {
    pub symbol: Option<Arc<str>>,
    pub kind: LimitKind,
    pub max_value: u128,
    pub active: bool,
}

impl RiskLimit {
    pub fn global(kind: LimitKind, max_value: u128) -> Self {
        Self {
            symbol: None,
            kind,
            max_value,
            active: true,
        }
    }

    pub fn for_symbol(symbol: impl Into<Arc<str>>, kind: LimitKind, max_value: u128) -> Self {
        Self {
            symbol: Some(symbol.into()),
            kind,
            max_value,
            active: true,
        }
    }
}

/// Formats the externally-visible order id: a prefix, a zero-padded
/// monotone sequence number, and a millisecond timestamp.
pub fn format_order_id(prefix: &str, sequence: u64, timestamp_ms: u64) -> String {
    format!("{prefix}{sequence:012}-{timestamp_ms}")
}

/// Formats the externally-visible trade id the same way, with its own prefix.
pub fn format_trade_id(prefix: &str, sequence: u64, timestamp_ms: u64) -> String {
    format!("{prefix}{sequence:012}-{timestamp_ms}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_accepts_or_rejects_only() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Accepted));
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Rejected));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::Filled));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::PartiallyFilled));
    }

    #[test]
    fn terminal_statuses_accept_no_further_transition() {
        for terminal in [OrderStatus::Filled, OrderStatus::Canceled, OrderStatus::Rejected] {
            assert!(terminal.is_terminal());
            for next in [
                OrderStatus::New,
                OrderStatus::Accepted,
                OrderStatus::PartiallyFilled,
                OrderStatus::Filled,
                OrderStatus::Canceled,
                OrderStatus::Rejected,
            ] {
                assert!(!terminal.can_transition_to(next), "{terminal:?} -> {next:?} should be illegal");
            }
        }
    }

    #[test]
    fn try_transition_leaves_status_unchanged_on_illegal_move() {
        let order = Order::default();
        assert_eq!(order.status(), OrderStatus::New);
        assert!(!order.try_transition(OrderStatus::Filled));
        assert_eq!(order.status(), OrderStatus::New, "an illegal transition must not mutate status");
        assert!(order.try_transition(OrderStatus::Accepted));
        assert_eq!(order.status(), OrderStatus::Accepted);
    }

    #[test]
    fn round_to_tick_nearest_even_breaks_ties_to_even_tick() {
        let instrument = Instrument::new("AAPL", 10, 1);
        assert_eq!(instrument.round_to_tick(105, TickRounding::NearestEven), 100);
        assert_eq!(instrument.round_to_tick(115, TickRounding::NearestEven), 120);
        assert_eq!(instrument.round_to_tick(104, TickRounding::NearestEven), 100);
        assert_eq!(instrument.round_to_tick(106, TickRounding::NearestEven), 110);
    }

    #[test]
    fn round_to_tick_down_and_up_floor_and_ceil() {
        let instrument = Instrument::new("AAPL", 10, 1);
        assert_eq!(instrument.round_to_tick(107, TickRounding::Down), 100);
        assert_eq!(instrument.round_to_tick(107, TickRounding::Up), 110);
        assert_eq!(instrument.round_to_tick(100, TickRounding::Down), 100, "exact multiples never move");
        assert_eq!(instrument.round_to_tick(100, TickRounding::Up), 100, "exact multiples never move");
    }
}
