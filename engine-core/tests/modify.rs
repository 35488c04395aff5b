mod common;

use crate::common::*;
use engine_core::prelude::*;
use std::sync::Arc;

fn next_trade_id_seq() -> impl FnMut() -> TradeId {
    let mut seq = 0u64;
    move || {
        seq += 1;
        seq
    }
}

#[test]
fn test_cancel_active_limit_order() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    book.insert(make_limit_order(1, Side::Buy, 100, 10, 1000));

    book.remove(1).unwrap();

    assert_eq!(get_book_state(&book, Side::Buy).len(), 0, "buy side should be empty after cancel");
}

#[test]
fn test_cancel_partially_filled_limit_order() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 100, 10, 1000));
    let buy = make_limit_order(2, Side::Buy, 100, 4, 1001);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    book.remove(1).unwrap();

    assert_eq!(get_book_state(&book, Side::Sell).len(), 0, "sell side should be empty after cancel");
}

#[test]
fn test_cancel_updates_status_and_reason() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    book.insert(make_limit_order(1, Side::Buy, 100, 10, 1000));

    let cancelled = book.remove(1).unwrap();

    assert_eq!(cancelled.status(), OrderStatus::Canceled);
    assert!(book.get_order(1).is_none(), "cancelled order should not be found in book");
}

#[test]
fn test_cancelled_order_not_in_book() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    book.insert(make_limit_order(1, Side::Sell, 100, 10, 1000));

    book.remove(1).unwrap();

    assert_eq!(get_book_state(&book, Side::Sell).len(), 0, "sell side should be empty after cancel");
}

#[test]
fn test_cancel_nonexistent_order_fails() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    assert!(book.remove(999).is_err(), "cancelling a nonexistent order should fail");
}

#[test]
fn test_modify_always_unsupported() {
    let engine = Engine::new(EngineConfig::default());
    let result = engine.modify("whatever-external-id");
    assert!(matches!(result, Err(EngineError::ModifyUnsupported)));
}
