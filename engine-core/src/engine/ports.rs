use crate::prelude::*;

/// PersistenceSink is opaque to the core: any implementation suffices, as
/// long as `save_order`/`save_trade` are idempotent on id and
/// `upsert_position` is idempotent on symbol. A failure here is logged and
/// never fatal; in-memory state remains authoritative.
pub trait PersistenceSink: Send + Sync {
    fn save_order(&self, order: &Order) -> Result<(), EngineError>;
    fn save_trade(&self, trade: &Trade) -> Result<(), EngineError>;
    fn upsert_position(&self, position: &PositionSnapshot) -> Result<(), EngineError>;
    fn load_positions(&self) -> Result<Vec<PositionSnapshot>, EngineError>;
    fn load_trades_by_day(&self, day: u64) -> Result<Vec<Trade>, EngineError>;
    fn load_orders_by_day(&self, day: u64) -> Result<Vec<Order>, EngineError>;
    fn is_available(&self) -> bool;
    fn status(&self) -> String;
}

/// NullPersistence is the no-op sink used when `persistence.enabled` is
/// false or no durable store is wired up.
pub struct NullPersistence;

impl PersistenceSink for NullPersistence {
    fn save_order(&self, _order: &Order) -> Result<(), EngineError> {
        Ok(())
    }
    fn save_trade(&self, _trade: &Trade) -> Result<(), EngineError> {
        Ok(())
    }
    fn upsert_position(&self, _position: &PositionSnapshot) -> Result<(), EngineError> {
        Ok(())
    }
    fn load_positions(&self) -> Result<Vec<PositionSnapshot>, EngineError> {
        Ok(Vec::new())
    }
    fn load_trades_by_day(&self, _day: u64) -> Result<Vec<Trade>, EngineError> {
        Ok(Vec::new())
    }
    fn load_orders_by_day(&self, _day: u64) -> Result<Vec<Order>, EngineError> {
        Ok(Vec::new())
    }
    fn is_available(&self) -> bool {
        true
    }
    fn status(&self) -> String {
        "disabled".to_string()
    }
}

/// MarketDataSource is the inbound tick contract: subscription management
/// plus the latest-tick cache the risk validator consults for a reference
/// price when an order carries no explicit limit.
pub trait MarketDataSource: Send + Sync {
    fn subscribe(&self, symbol: &str) -> Result<(), EngineError>;
    fn unsubscribe(&self, symbol: &str) -> Result<(), EngineError>;
    fn get_latest_tick(&self, symbol: &str) -> Option<Tick>;
}
