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
fn test_limit_order_full_fill_removal() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 100, 10, 1000));
    let buy = make_limit_order(2, Side::Buy, 100, 10, 1001);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 0, "sell order should be fully filled and removed");
}

#[test]
fn test_limit_order_priority_by_time() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 100, 10, 1000)); // earlier
    book.insert(make_limit_order(2, Side::Sell, 100, 10, 1005)); // later

    let buy = make_limit_order(3, Side::Buy, 100, 10, 1010);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].0, 2, "sell1 should be matched first, sell2 remains");
}

#[test]
fn test_limit_order_no_cross_no_fill() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 105, 10, 1000)); // higher price
    let buy = make_limit_order(2, Side::Buy, 100, 10, 1001); // lower price
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    assert_eq!(get_book_state(&book, Side::Sell).len(), 1, "sell should stay, price too high");
    assert_eq!(get_book_state(&book, Side::Buy).len(), 1, "buy should stay, price too low");
}

#[test]
fn test_limit_order_multiple_partial_fills() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 100, 5, 1000));
    book.insert(make_limit_order(2, Side::Sell, 100, 5, 1001));

    let buy = make_limit_order(3, Side::Buy, 100, 8, 1002);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 1, "one partially remaining sell order expected");
    assert_eq!(remaining[0], (2, 2), "sell2 should have 2 remaining units");
}

#[test]
fn test_limit_order_partial_then_cancel() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(1, Side::Sell, 100, 10, 1000));
    let buy = make_limit_order(2, Side::Buy, 100, 4, 1001);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    book.remove(1).unwrap();

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 0, "remaining sell order should be cancelled");
}

#[test]
fn test_limit_order_partial_and_full_match() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(101, Side::Sell, 100, 10, 1000));
    book.insert(make_limit_order(102, Side::Sell, 100, 10, 1001));

    let buy = make_limit_order(200, Side::Buy, 100, 6, 1002);
    let mut seq = next_trade_id_seq();
    matcher.submit(buy, 2000, &mut seq);

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0], (101, 4));
    assert_eq!(remaining[1], (102, 10));
}

#[test]
fn test_limit_order_iter_continues_after_remove() {
    let book = Arc::new(DefaultOrderBook::new("TEST"));
    let matcher = DefaultMatchingEngine::new(book.clone());

    book.insert(make_limit_order(101, Side::Sell, 100, 10, 1000));
    book.insert(make_limit_order(102, Side::Sell, 100, 10, 1001));
    book.insert(make_limit_order(103, Side::Sell, 100, 10, 1002));

    let mut seq = next_trade_id_seq();
    matcher.submit(make_limit_order(200, Side::Buy, 100, 11, 990), 2000, &mut seq);
    matcher.submit(make_limit_order(201, Side::Buy, 100, 4, 991), 2001, &mut seq);

    let remaining = get_book_state(&book, Side::Sell);
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0], (102, 5));
    assert_eq!(remaining[1], (103, 10));
}
