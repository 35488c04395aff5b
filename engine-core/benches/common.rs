use engine_core::prelude::*;
use std::sync::Arc;

pub fn make_limit_order(id: OrderId, side: Side, price: u64, qty: u64, ts: u64) -> Order {
    let mut order = Order::default();
    order.id = id;
    order.symbol = Arc::from("TEST");
    order.side = side;
    order.price = Price::from(price);
    order.requested_quantity = Quantity::from(qty);
    *order.quantity.get_mut() = Quantity::from(qty);
    order.created_at = ts;
    order.updated_at = ts;
    order
}

pub fn make_market_order(id: OrderId, side: Side, qty: u64, ts: u64) -> Order {
    let mut order = make_limit_order(id, side, 0, qty, ts);
    order.order_type = OrderType::Market;
    order
}
