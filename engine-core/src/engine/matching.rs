use crate::prelude::*;
use crypto_bigint::Zero;
use std::sync::Arc;

/// MatchOutcome is everything one `submit` call produced: the taker order
/// in its final post-match state, the maker/taker trade pairs generated
/// along the way, and a snapshot of every resting maker order touched
/// (whether it was fully consumed and removed, or partially filled and
/// left resting). The facade folds these into execution reports, the
/// position ledger, and the observer registry; matching itself never
/// touches any of that.
pub struct MatchOutcome {
    pub taker: Order,
    pub trades: Vec<Trade>,
    pub maker_updates: Vec<Order>,
}

/// MatchingEngine is the trait the facade drives: submit a freshly
/// validated order and get back everything that happened. `next_trade_id`
/// is supplied by the caller so trade ids stay unique across every
/// symbol's matching engine rather than per-instance.
pub trait MatchingEngine {
    fn submit(
        &self,
        order: Order,
        now_micros: u64,
        next_trade_id: &mut dyn FnMut() -> TradeId,
    ) -> MatchOutcome;
}

/// DefaultMatchingEngine crosses an incoming order against one
/// instrument's book. LIMIT orders cross while the best opposing price
/// still satisfies the limit and rest whatever quantity remains; MARKET
/// orders cross unconditionally and have their residue canceled once the
/// book is exhausted, since a market order never rests.
pub struct DefaultMatchingEngine<B: OrderBookWalker> {
    book: Arc<B>,
}

impl<B: OrderBookWalker> DefaultMatchingEngine<B> {
    pub fn new(book: Arc<B>) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &Arc<B> {
        &self.book
    }

    /// Whether `maker`'s price still satisfies `taker`'s limit, if any.
    /// `None` means the taker is a market order: it crosses unconditionally.
    fn still_crosses(taker_side: Side, taker_limit: Option<Price>, maker_price: Price) -> bool {
        match taker_limit {
            None => true,
            Some(limit) => match taker_side {
                Side::Buy => maker_price <= limit,
                Side::Sell => maker_price >= limit,
            },
        }
    }
}

impl<B: OrderBookWalker> MatchingEngine for DefaultMatchingEngine<B> {
    fn submit(
        &self,
        mut taker: Order,
        now_micros: u64,
        next_trade_id: &mut dyn FnMut() -> TradeId,
    ) -> MatchOutcome {
        // No-op when the order already arrived `Accepted` (the facade
        // transitions it synchronously on submission, before it is ever
        // queued); still needed for callers that build an order directly
        // and hand it to the matching engine without going through the
        // facade's submission path.
        taker.try_transition(OrderStatus::Accepted);

        let taker_limit = match taker.order_type {
            OrderType::Limit => Some(taker.price),
            OrderType::Market => None,
        };

        let mut trades = Vec::new();
        let mut maker_updates = Vec::new();

        self.book.walk_cross(taker.side, &mut |maker| {
            if bool::from(taker.quantity().is_zero()) {
                return WalkingResult::exit();
            }
            if !Self::still_crosses(taker.side, taker_limit, maker.price) {
                return WalkingResult::exit();
            }
            if !maker.enter_matched() {
                // Being canceled or claimed elsewhere right now; leave it
                // and try the next resting order.
                return WalkingResult::next();
            }

            match Trade::matched(&mut *next_trade_id, now_micros, &taker, maker) {
                None => {
                    maker.exit_matched();
                    WalkingResult::next()
                }
                Some((maker_trade, taker_trade)) => {
                    trades.push(maker_trade);
                    trades.push(taker_trade);

                    if maker.status().is_terminal() {
                        maker.enter_finished_from_matched();
                        maker_updates.push(maker.clone());
                        WalkingResult::remove_and_next()
                    } else {
                        let snapshot = maker.clone_reset_lifecycle();
                        maker.exit_matched();
                        maker_updates.push(snapshot);
                        WalkingResult::next()
                    }
                }
            }
        });

        if !bool::from(taker.quantity().is_zero()) {
            match taker.order_type {
                OrderType::Market => {
                    taker.try_transition(OrderStatus::Canceled);
                    taker.update_cancel_reason(CancelReason::InsufficientLiquidity);
                }
                OrderType::Limit => {
                    self.book.insert(taker.clone());
                }
            }
        }

        MatchOutcome {
            taker,
            trades,
            maker_updates,
        }
    }
}
