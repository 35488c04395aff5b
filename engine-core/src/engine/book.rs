use crate::prelude::*;
use crossbeam::epoch;
use crossbeam::epoch::default_collector;
use crossbeam_skiplist::SkipList;
use flurry::HashMap;

/// OrderBook is the mechanical contract a price-level book exposes to the
/// matching engine: insert, cancel, update-in-place, and best-price lookup.
/// It has no notion of observers or reports; those are assembled one layer
/// up, from the values this trait returns, per the "no cyclic engine <->
/// component references" redesign this system follows.
pub trait OrderBook {
    fn insert(&self, order: Order);
    fn remove(&self, order_id: OrderId) -> Result<Order, CancelOrderError>;
    fn get_best_price(&self, side: Side) -> Option<Price>;
    fn get_book(&self, side: Side) -> &SkipList<BookKey, Order>;
    fn get_order(&self, order_id: OrderId) -> Option<Order>;
}

/// WalkingResult tells a book walk whether to remove the current entry
/// and/or stop walking.
pub struct WalkingResult {
    pub remove: bool,
    pub exit: bool,
}

impl WalkingResult {
    pub fn next() -> Self {
        Self {
            remove: false,
            exit: false,
        }
    }

    pub fn remove_and_next() -> Self {
        Self {
            remove: true,
            exit: false,
        }
    }

    pub fn exit() -> Self {
        Self {
            remove: false,
            exit: true,
        }
    }

    pub fn remove_and_exit() -> Self {
        Self {
            remove: true,
            exit: true,
        }
    }
}

/// MatchingEngineWalker exposes the two walk shapes the matching engine
/// needs over a price-level book: walking one side up to a limit (or
/// unconditionally, for a market order), and walking a live cross between
/// both sides until prices no longer overlap.
pub trait MatchingEngineWalker {
    fn walk_side(
        &self,
        side: Side,
        limit_price: Option<Price>,
        walk: &mut dyn FnMut(&Order) -> WalkingResult,
    );

    fn walk_cross(&self, taker_side: Side, walk: &mut dyn FnMut(&Order) -> WalkingResult);
}

pub trait OrderBookWalker: Send + Sync + OrderBook + MatchingEngineWalker {}

/// DefaultOrderBook is a single instrument's price-level book: two
/// price-indexed skip lists (bids descending, asks ascending), each price
/// level a FIFO of resting orders by arrival priority, plus an id-keyed
/// index for O(1) cancel/lookup.
pub struct DefaultOrderBook {
    symbol: std::sync::Arc<str>,
    buy_orders: SkipList<BookKey, Order>,
    sell_orders: SkipList<BookKey, Order>,
    order_index: HashMap<OrderId, BookKey>,
}

impl DefaultOrderBook {
    pub fn new(symbol: impl Into<std::sync::Arc<str>>) -> Self {
        let collector = default_collector().clone();
        Self {
            symbol: symbol.into(),
            buy_orders: SkipList::new(collector.clone()),
            sell_orders: SkipList::new(collector),
            order_index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &std::sync::Arc<str> {
        &self.symbol
    }

    fn side_book(&self, side: Side) -> &SkipList<BookKey, Order> {
        match side {
            Side::Buy => &self.buy_orders,
            Side::Sell => &self.sell_orders,
        }
    }
}

impl OrderBook for DefaultOrderBook {
    fn insert(&self, mut order: Order) {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();

        order.try_transition(OrderStatus::Accepted);
        let order_id = order.id;
        let book_key = order.book_key();
        self.side_book(order.side)
            .get_or_insert(book_key, order, guard);
        order_index.insert(order_id, book_key);
    }

    fn remove(&self, order_id: OrderId) -> Result<Order, CancelOrderError> {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();
        let book_key = *order_index
            .get(&order_id)
            .ok_or(CancelOrderError::OrderNotFound)?;

        let order_entry = self
            .side_book(book_key.side)
            .get(&book_key, guard)
            .ok_or(CancelOrderError::OrderNotFound)?;

        let order = order_entry.value();
        if !order.enter_finished_from_active() {
            return Err(CancelOrderError::OrderNotCancellable);
        }
        if !order.try_transition(OrderStatus::Canceled) {
            return Err(CancelOrderError::OrderNotCancellable);
        }
        order.update_cancel_reason(CancelReason::UserRequest);
        let cancelled = order.clone();

        order_entry.remove();
        order_index.remove(&order_id);
        Ok(cancelled)
    }

    fn get_best_price(&self, side: Side) -> Option<Price> {
        let guard = &epoch::pin();
        self.side_book(side).front(guard).map(|e| e.key().price)
    }

    fn get_book(&self, side: Side) -> &SkipList<BookKey, Order> {
        self.side_book(side)
    }

    fn get_order(&self, order_id: OrderId) -> Option<Order> {
        let guard = &epoch::pin();
        let order_index = self.order_index.pin();
        let book_key = *order_index.get(&order_id)?;
        self.side_book(book_key.side)
            .get(&book_key, guard)
            .map(|e| e.value().clone())
    }
}

impl MatchingEngineWalker for DefaultOrderBook {
    fn walk_side(
        &self,
        side: Side,
        limit_price: Option<Price>,
        walk: &mut dyn FnMut(&Order) -> WalkingResult,
    ) {
        let guard = &epoch::pin();
        let book = self.side_book(side);
        let mut entry = book.front(guard);
        while let Some(e) = entry {
            let key = e.key();
            if let Some(limit) = limit_price {
                let crosses = match side {
                    Side::Buy => key.price >= limit,
                    Side::Sell => key.price <= limit,
                };
                if !crosses {
                    break;
                }
            }

            let order = e.value();
            let result = walk(order);
            if result.remove {
                e.remove();
            }
            if result.exit {
                break;
            }
            entry = e.next();
        }
    }

    fn walk_cross(&self, taker_side: Side, walk: &mut dyn FnMut(&Order) -> WalkingResult) {
        // The taker rests on `taker_side`'s opposite book; walk the opposite
        // side unconditionally (market semantics) so the caller's own limit
        // check (via `walk`'s returned `exit`) governs how far the cross goes.
        let guard = &epoch::pin();
        let opposite = taker_side.opposite();
        let book = self.side_book(opposite);
        let mut entry = book.front(guard);
        while let Some(e) = entry {
            let order = e.value();
            let result = walk(order);
            if result.remove {
                e.remove();
            }
            if result.exit {
                break;
            }
            entry = e.next();
        }
    }
}

impl OrderBookWalker for DefaultOrderBook {}
