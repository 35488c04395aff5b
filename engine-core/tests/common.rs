use crossbeam::epoch;
use crossbeam::epoch::default_collector;
use crossbeam_skiplist::SkipList;
use engine_core::prelude::*;

/// Quickly builds a limit order for testing, bypassing `Engine::submit`'s
/// validation/risk path so tests can drive the book and matching engine
/// directly.
pub fn make_limit_order(id: OrderId, side: Side, price: u64, qty: u64, ts: u64) -> Order {
    let mut order = Order::default();
    order.id = id;
    order.symbol = std::sync::Arc::from("TEST");
    order.side = side;
    order.price = Price::from(price);
    order.requested_quantity = Quantity::from(qty);
    *order.quantity.get_mut() = Quantity::from(qty);
    order.created_at = ts;
    order.updated_at = ts;
    order
}

/// Quickly builds a market order for testing.
pub fn make_market_order(id: OrderId, side: Side, qty: u64, ts: u64) -> Order {
    let mut order = make_limit_order(id, side, 0, qty, ts);
    order.order_type = OrderType::Market;
    order
}

/// Snapshots one side of the book as `(order_id, remaining_quantity)` pairs
/// in book order.
pub fn get_book_state(book: &DefaultOrderBook, side: Side) -> Vec<(OrderId, u128)> {
    let guard = &epoch::pin();
    book.get_book(side)
        .iter(guard)
        .map(|entry| (entry.value().id, narrow_to_u128(entry.value().quantity())))
        .collect()
}

#[test]
fn test_skiplist_next_when_delete() {
    let list = SkipList::new(default_collector().clone());
    let guard = &epoch::pin();
    let _entry1 = list.get_or_insert(1, 1, guard);
    let entry2 = list.get_or_insert(2, 2, guard);
    let _entry3 = list.get_or_insert(3, 3, guard);

    let front = list.front(guard).unwrap();
    entry2.remove(guard);
    let next = front.next().unwrap();
    let tail = next.next();

    assert_eq!(front.key(), &1);
    assert_eq!(next.key(), &3);
    assert!(tail.is_none());
}
