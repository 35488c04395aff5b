use std::collections::HashMap;
use std::sync::Arc;

/// Tick rounding policy applied to a limit order's price on acceptance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickRounding {
    NearestEven,
    Down,
    Up,
}

impl Default for TickRounding {
    fn default() -> Self {
        TickRounding::NearestEven
    }
}

/// Global (not-yet-overridden) risk caps. Each field mirrors a
/// `risk.max_*` configuration option.
#[derive(Clone, Copy, Debug)]
pub struct RiskCaps {
    pub max_order_size: Option<u128>,
    pub max_position_size: Option<u128>,
    pub max_daily_volume: Option<u128>,
    pub max_daily_loss: Option<u128>,
    pub max_portfolio_notional: Option<u128>,
}

impl Default for RiskCaps {
    fn default() -> Self {
        Self {
            max_order_size: None,
            max_position_size: None,
            max_daily_volume: None,
            max_daily_loss: None,
            max_portfolio_notional: None,
        }
    }
}

/// `EngineConfig` is a plain value constructed by the embedder and passed
/// by value (or behind an `Arc`) to `Engine::new`. There is no global or
/// thread-local configuration state anywhere in this crate.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Event queue capacity; should be a power of two.
    pub queue_capacity: usize,
    /// Global risk caps, overridden per symbol via `symbol_risk_overrides`.
    pub risk: RiskCaps,
    /// Per-symbol overrides; a symbol absent here falls back to `risk`.
    pub symbol_risk_overrides: HashMap<Arc<str>, RiskCaps>,
    /// Kill switch feeding the trading-enabled risk check.
    pub trading_enabled: bool,
    /// Fraction of order notional used as the conservative downside proxy
    /// in the daily-loss check.
    pub order_loss_estimate_fraction: f64,
    /// A tick is stale if older than this many milliseconds.
    pub market_data_stale_threshold_ms: u64,
    pub tick_rounding: TickRounding,
    /// When false, persistence save/upsert calls are no-ops.
    pub persistence_enabled: bool,
    pub order_id_prefix: String,
    pub trade_id_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            risk: RiskCaps::default(),
            symbol_risk_overrides: HashMap::new(),
            trading_enabled: true,
            order_loss_estimate_fraction: 0.05,
            market_data_stale_threshold_ms: 5000,
            tick_rounding: TickRounding::default(),
            persistence_enabled: true,
            order_id_prefix: "ORD".to_string(),
            trade_id_prefix: "TRD".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn effective_risk_caps(&self, symbol: &str) -> RiskCaps {
        let Some(override_caps) = self.symbol_risk_overrides.get(symbol) else {
            return self.risk;
        };
        RiskCaps {
            max_order_size: override_caps.max_order_size.or(self.risk.max_order_size),
            max_position_size: override_caps
                .max_position_size
                .or(self.risk.max_position_size),
            max_daily_volume: override_caps
                .max_daily_volume
                .or(self.risk.max_daily_volume),
            max_daily_loss: override_caps.max_daily_loss.or(self.risk.max_daily_loss),
            max_portfolio_notional: override_caps
                .max_portfolio_notional
                .or(self.risk.max_portfolio_notional),
        }
    }
}
