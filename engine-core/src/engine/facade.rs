use crate::prelude::*;
use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

/// One instrument's book plus the matching engine that crosses orders
/// against it. `Engine` owns one of these per registered symbol.
struct SymbolContext {
    book: Arc<DefaultOrderBook>,
    matcher: DefaultMatchingEngine<DefaultOrderBook>,
}

impl SymbolContext {
    fn new(symbol: Arc<str>) -> Self {
        let book = Arc::new(DefaultOrderBook::new(symbol));
        let matcher = DefaultMatchingEngine::new(book.clone());
        Self { book, matcher }
    }
}

/// `Engine` is the single entry point an embedder talks to: it validates
/// and risk-checks inbound requests, serializes matching through one event
/// queue per the engine's single-writer concurrency model, and exposes the
/// read-only queries and lifecycle operations (cancel, daily roll) that sit
/// outside that queue because they're made safe by `OrderLifecycle`'s own
/// compare-and-swap authority instead.
pub struct Engine {
    config: EngineConfig,
    queue: Arc<EventQueue>,
    symbols: RwLock<HashMap<Arc<str>, SymbolContext>>,
    instruments: RwLock<HashMap<Arc<str>, Instrument>>,
    positions: PositionLedger,
    observers: RwLock<ObserverRegistry>,
    persistence: Arc<dyn PersistenceSink>,
    market_data: Option<Arc<dyn MarketDataSource>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    external_ids: RwLock<HashMap<String, OrderId>>,
    order_external_ids: RwLock<HashMap<OrderId, String>>,
    trades_by_order: RwLock<HashMap<OrderId, Vec<Trade>>>,
    trades_by_symbol: RwLock<HashMap<Arc<str>, Vec<Trade>>>,
    daily_trades: RwLock<Vec<Trade>>,
    order_sequence: AtomicU64,
    trade_sequence: AtomicU64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_persistence(config, Arc::new(NullPersistence))
    }

    pub fn with_persistence(config: EngineConfig, persistence: Arc<dyn PersistenceSink>) -> Self {
        let queue = Arc::new(EventQueue::new(config.queue_capacity));
        Self {
            config,
            queue,
            symbols: RwLock::new(HashMap::new()),
            instruments: RwLock::new(HashMap::new()),
            positions: PositionLedger::new(),
            observers: RwLock::new(ObserverRegistry::new()),
            persistence,
            market_data: None,
            orders: RwLock::new(HashMap::new()),
            external_ids: RwLock::new(HashMap::new()),
            order_external_ids: RwLock::new(HashMap::new()),
            trades_by_order: RwLock::new(HashMap::new()),
            trades_by_symbol: RwLock::new(HashMap::new()),
            daily_trades: RwLock::new(Vec::new()),
            order_sequence: AtomicU64::new(0),
            trade_sequence: AtomicU64::new(0),
        }
    }

    pub fn set_market_data_source(&mut self, source: Arc<dyn MarketDataSource>) {
        self.market_data = Some(source);
    }

    pub fn register_observer(&self, observer: Arc<dyn EngineObserver>) {
        self.observers.write().expect("observer registry poisoned").register(observer);
    }

    pub fn register_instrument(&self, instrument: Instrument) {
        let symbol = instrument.symbol.clone();
        self.symbols
            .write()
            .expect("symbol table poisoned")
            .entry(symbol.clone())
            .or_insert_with(|| SymbolContext::new(symbol.clone()));
        self.instruments
            .write()
            .expect("instrument table poisoned")
            .insert(symbol.clone(), instrument);
        if let Some(source) = &self.market_data {
            if let Err(err) = source.subscribe(&symbol) {
                tracing::warn!(?err, %symbol, "failed to subscribe to market data for newly registered instrument");
            }
        }
    }

    fn next_order_id(&self) -> OrderId {
        self.order_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn next_trade_id(&self) -> TradeId {
        self.trade_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn reference_price(&self, request: &OrderRequest) -> Option<u128> {
        match request.order_type {
            OrderType::Limit => Some(narrow_to_u128(request.price)),
            OrderType::Market => self
                .instruments
                .read()
                .expect("instrument table poisoned")
                .get(&request.symbol)
                .and_then(|i| i.last.or(i.mid_price())),
        }
    }

    fn round_request(&self, mut request: OrderRequest) -> OrderRequest {
        if let Some(instrument) = self
            .instruments
            .read()
            .expect("instrument table poisoned")
            .get(&request.symbol)
        {
            let rounded_qty = instrument.round_to_lot(narrow_to_u128(request.quantity));
            request.quantity = widen_from_u128(rounded_qty);
            if request.order_type == OrderType::Limit {
                let rounded_price = instrument.round_to_tick(narrow_to_u128(request.price), self.config.tick_rounding);
                request.price = widen_from_u128(rounded_price);
            }
        }
        request
    }

    /// Validates and risk-checks `request`, then either enqueues it for
    /// matching and returns the external order id, or publishes a single
    /// rejection report and returns the reason. A caller never needs to
    /// poll for whether a rejected submission "really" made it in: a
    /// rejection here is final.
    pub fn submit(&self, request: OrderRequest, now: u64) -> Result<String, EngineError> {
        if !self
            .symbols
            .read()
            .expect("symbol table poisoned")
            .contains_key(&request.symbol)
        {
            return Err(EngineError::Validation(format!(
                "unknown symbol: {}",
                request.symbol
            )));
        }

        let request = self.round_request(request);
        let reference_price = self.reference_price(&request);
        let snapshot = self.positions.snapshot();

        let order_id = self.next_order_id();
        let external_id = format_order_id(&self.config.order_id_prefix, order_id, now);

        self.remember_external_id(order_id, &external_id);

        if let Err(reason) =
            RiskValidator::validate(&request, &snapshot, &self.config, now, reference_price)
        {
            let rejected = self.build_order(order_id, &request, now);
            rejected.try_transition(OrderStatus::Rejected);
            rejected.update_rejection_reason(reason.clone());
            self.publish_and_record(&rejected, &external_id, now);
            return Err(EngineError::RiskRejection(reason));
        }

        let order = self.build_order(order_id, &request, now);
        self.orders
            .write()
            .expect("order table poisoned")
            .insert(order_id, order.clone());

        self.queue.try_push(EngineEvent::NewOrder(order))?;
        Ok(external_id)
    }

    fn remember_external_id(&self, order_id: OrderId, external_id: &str) {
        self.external_ids
            .write()
            .expect("external id table poisoned")
            .insert(external_id.to_string(), order_id);
        self.order_external_ids
            .write()
            .expect("order external id table poisoned")
            .insert(order_id, external_id.to_string());
    }

    /// Builds a freshly-validated order. The record is created in
    /// `Accepted` state: per the submission contract, an order that passed
    /// risk checks and is about to enter the book (or be queued for it) is
    /// already accepted the moment a caller can observe it through
    /// `get_order`, not only once the matching worker eventually drains it
    /// off the event queue.
    fn build_order(&self, order_id: OrderId, request: &OrderRequest, now: u64) -> Order {
        let order = Order {
            id: order_id,
            symbol: request.symbol.clone(),
            side: request.side,
            lifecycle: AtomicU8::new(OrderLifecycle::Active.into()),
            order_type: request.order_type,
            status: UnsafeCell::new(OrderStatus::New),
            price: request.price,
            requested_quantity: request.quantity,
            quantity: UnsafeCell::new(request.quantity),
            filled_quantity: UnsafeCell::new(Quantity::ZERO),
            total_fill_value: UnsafeCell::new(0),
            cancel_reason: UnsafeCell::new(None),
            rejection_reason: UnsafeCell::new(None),
            created_at: now,
            updated_at: now,
        };
        order.try_transition(OrderStatus::Accepted);
        order
    }

    /// Cancellation bypasses the event queue: `OrderLifecycle`'s
    /// compare-and-swap is the sole authority over whether an order may be
    /// removed, so a cancel from any caller thread is already safe to race
    /// against the matching worker without further serialization.
    pub fn cancel(&self, external_id: &str, now: u64) -> Result<(), EngineError> {
        let order_id = self
            .external_ids
            .read()
            .expect("external id table poisoned")
            .get(external_id)
            .copied()
            .ok_or(EngineError::NotFound(0))?;
        self.process_cancel(order_id, now)
    }

    fn process_cancel(&self, order_id: OrderId, now: u64) -> Result<(), EngineError> {
        let symbol = self
            .orders
            .read()
            .expect("order table poisoned")
            .get(&order_id)
            .map(|o| o.symbol.clone())
            .ok_or(EngineError::NotFound(order_id))?;
        let symbols = self.symbols.read().expect("symbol table poisoned");
        let context = symbols
            .get(&symbol)
            .ok_or(EngineError::NotFound(order_id))?;
        match context.book.remove(order_id) {
            Ok(cancelled) => {
                let external_id = self.external_id_for(order_id);
                self.publish_and_record(&cancelled, &external_id, now);
                Ok(())
            }
            Err(CancelOrderError::OrderNotFound) => Err(EngineError::NotFound(order_id)),
            Err(CancelOrderError::OrderNotCancellable) => Err(EngineError::NotCancelable(order_id)),
        }
    }

    /// Modify is never supported: callers cancel and resubmit.
    pub fn modify(&self, _external_id: &str) -> Result<(), EngineError> {
        Err(EngineError::ModifyUnsupported)
    }

    /// Submits a market-data tick for mark-to-market and instrument state.
    pub fn submit_tick(&self, tick: Tick) -> Result<(), EngineError> {
        self.queue.try_push(EngineEvent::MarketTick(tick))
    }

    pub fn request_shutdown(&self) {
        self.queue.request_shutdown();
    }

    /// Drains whatever is currently queued without blocking, driving
    /// matching/position/observer updates inline. Returns the number of
    /// events processed. Intended to be driven either by a dedicated
    /// worker thread in a loop, or directly by tests/embedders that want
    /// synchronous, deterministic control over when matching happens.
    pub fn process_pending(&self, now_micros: u64) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.try_pop() {
            let is_shutdown = matches!(event, EngineEvent::Shutdown);
            self.handle_event(event, now_micros);
            processed += 1;
            if is_shutdown {
                break;
            }
        }
        processed
    }

    /// Runs the worker loop until a shutdown is requested and drained.
    /// `now_micros` is called once per iteration so tests can supply a
    /// deterministic clock; production callers pass a wall-clock reader.
    pub fn run_worker(&self, now_micros: impl Fn() -> u64) {
        loop {
            match self.queue.try_pop() {
                Some(EngineEvent::Shutdown) => break,
                Some(event) => self.handle_event(event, now_micros()),
                None => {
                    if self.queue.is_shutting_down() {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        }
    }

    fn handle_event(&self, event: EngineEvent, now_micros: u64) {
        match event {
            EngineEvent::NewOrder(order) => self.handle_new_order(order, now_micros),
            EngineEvent::Cancel(order_id) => {
                if let Err(err) = self.process_cancel(order_id, now_micros) {
                    tracing::warn!(?err, order_id, "queued cancel could not be completed");
                }
            }
            EngineEvent::Execute(order_id) => {
                tracing::debug!(order_id, "explicit execute event received (test hook, no-op)");
            }
            EngineEvent::MarketTick(tick) => self.handle_tick(tick, now_micros),
            EngineEvent::TradeProduced(trade) => {
                self.observers
                    .read()
                    .expect("observer registry poisoned")
                    .notify_trade(&trade);
            }
            EngineEvent::Shutdown => {}
        }
    }

    fn handle_new_order(&self, order: Order, now_micros: u64) {
        let symbol = order.symbol.clone();
        let symbols = self.symbols.read().expect("symbol table poisoned");
        let Some(context) = symbols.get(&symbol) else {
            tracing::error!(%symbol, "order queued for a symbol with no registered book");
            return;
        };

        let mut next_trade_id = || self.next_trade_id();
        let outcome = context.matcher.submit(order, now_micros, &mut next_trade_id);
        drop(symbols);

        for trade in &outcome.trades {
            self.record_trade(trade.clone());
            self.observers
                .read()
                .expect("observer registry poisoned")
                .notify_trade(trade);

            let signed_quantity = trade.side.sign() * narrow_to_u128(trade.quantity) as i128;
            let snapshot = self.positions.apply_fill(
                &trade.symbol,
                signed_quantity,
                narrow_to_u128(trade.price),
                now_micros,
            );
            self.observers
                .read()
                .expect("observer registry poisoned")
                .notify_position_update(&snapshot);

            if self.config.persistence_enabled {
                if let Err(err) = self.persistence.save_trade(trade) {
                    tracing::error!(?err, trade_id = trade.id, "failed to persist trade");
                }
            }
        }

        for maker in &outcome.maker_updates {
            let external_id = self.external_id_for(maker.id);
            self.publish_and_record(maker, &external_id, now_micros);
        }

        let taker_external_id = self.external_id_for(outcome.taker.id);
        self.publish_and_record(&outcome.taker, &taker_external_id, now_micros);
    }

    fn handle_tick(&self, tick: Tick, now_micros: u64) {
        if let Some(instrument) = self
            .instruments
            .write()
            .expect("instrument table poisoned")
            .get_mut(&tick.symbol)
        {
            instrument.bid = Some(tick.bid);
            instrument.ask = Some(tick.ask);
            instrument.last = Some(tick.last);
            instrument.last_update = tick.timestamp;
        }
        if let Some(snapshot) = self.positions.mark_to_market(&tick.symbol, tick.last, now_micros) {
            self.observers
                .read()
                .expect("observer registry poisoned")
                .notify_position_update(&snapshot);
        }
    }

    fn external_id_for(&self, order_id: OrderId) -> String {
        self.order_external_ids
            .read()
            .expect("order external id table poisoned")
            .get(&order_id)
            .cloned()
            .unwrap_or_else(|| format_order_id(&self.config.order_id_prefix, order_id, 0))
    }

    fn record_trade(&self, trade: Trade) {
        self.trades_by_order
            .write()
            .expect("trades-by-order table poisoned")
            .entry(trade.order_id)
            .or_default()
            .push(trade.clone());
        self.trades_by_symbol
            .write()
            .expect("trades-by-symbol table poisoned")
            .entry(trade.symbol.clone())
            .or_default()
            .push(trade.clone());
        self.daily_trades
            .write()
            .expect("daily trades buffer poisoned")
            .push(trade);
    }

    fn publish_and_record(&self, order: &Order, external_id: &str, now_micros: u64) {
        let old_status = self
            .orders
            .read()
            .expect("order table poisoned")
            .get(&order.id)
            .map(|o| o.status())
            .unwrap_or(OrderStatus::New);

        if self.config.persistence_enabled {
            if let Err(err) = self.persistence.save_order(order) {
                tracing::error!(?err, order_id = order.id, "failed to persist order");
            }
        }

        let report = ExecutionReport {
            order_id: order.id,
            external_id: external_id.to_string(),
            symbol: order.symbol.clone(),
            old_status,
            new_status: order.status(),
            filled_quantity: order.filled_quantity(),
            remaining_quantity: order.quantity(),
            exec_price: order.average_fill_price().map(widen_from_u128),
            timestamp: now_micros,
            rejection_reason: order.rejection_reason(),
        };
        self.observers
            .read()
            .expect("observer registry poisoned")
            .notify_execution_report(&report);

        self.orders
            .write()
            .expect("order table poisoned")
            .insert(order.id, order.clone());
    }

    pub fn get_order(&self, external_id: &str) -> Option<Order> {
        let order_id = *self
            .external_ids
            .read()
            .expect("external id table poisoned")
            .get(external_id)?;
        self.orders
            .read()
            .expect("order table poisoned")
            .get(&order_id)
            .cloned()
    }

    pub fn get_working_orders(&self, symbol: &str) -> Vec<Order> {
        self.orders
            .read()
            .expect("order table poisoned")
            .values()
            .filter(|o| &*o.symbol == symbol && !o.status().is_terminal())
            .cloned()
            .collect()
    }

    pub fn get_orders_by_symbol(&self, symbol: &str) -> Vec<Order> {
        self.orders
            .read()
            .expect("order table poisoned")
            .values()
            .filter(|o| &*o.symbol == symbol)
            .cloned()
            .collect()
    }

    pub fn get_position(&self, symbol: &str) -> Option<PositionSnapshot> {
        self.positions.get(symbol)
    }

    pub fn get_all_positions(&self) -> Vec<PositionSnapshot> {
        self.positions.all()
    }

    pub fn get_trades_by_order(&self, order_id: OrderId) -> Vec<Trade> {
        self.trades_by_order
            .read()
            .expect("trades-by-order table poisoned")
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_trades_by_symbol(&self, symbol: &str) -> Vec<Trade> {
        self.trades_by_symbol
            .read()
            .expect("trades-by-symbol table poisoned")
            .get(symbol)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_daily_trades(&self) -> Vec<Trade> {
        self.daily_trades
            .read()
            .expect("daily trades buffer poisoned")
            .clone()
    }

    /// Rolls every symbol's daily counters: realized P&L and traded
    /// volume reset, running quantity and average cost carry forward.
    /// Never wired to wall-clock time; an operator (or a scheduled job
    /// outside this crate) decides when a trading day ends.
    pub fn trigger_daily_roll(&self, now_micros: u64) {
        let snapshots = self.positions.roll_daily(now_micros);
        let observers = self.observers.read().expect("observer registry poisoned");
        for snapshot in &snapshots {
            observers.notify_position_update(snapshot);
        }
        drop(observers);
        self.daily_trades
            .write()
            .expect("daily trades buffer poisoned")
            .clear();
        tracing::info!("daily roll completed");
    }
}
