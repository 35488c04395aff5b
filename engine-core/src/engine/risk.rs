use crate::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// A read-only snapshot of one symbol's ledger state, as seen by the risk
/// validator. The validator never mutates the ledger; it takes a
/// consistent copy and reasons over it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymbolLedgerSnapshot {
    pub quantity: i128,
    pub avg_cost: u128,
    pub daily_traded_volume: u128,
}

/// `LedgerSnapshot` is the consistent view of the whole position ledger the
/// risk validator is given for one `validate` call.
#[derive(Clone, Debug, Default)]
pub struct LedgerSnapshot {
    pub per_symbol: HashMap<Arc<str>, SymbolLedgerSnapshot>,
    pub daily_realized_pnl: i128,
    pub daily_unrealized_pnl: i128,
}

impl LedgerSnapshot {
    pub fn symbol(&self, symbol: &str) -> SymbolLedgerSnapshot {
        self.per_symbol.get(symbol).copied().unwrap_or_default()
    }

    /// Sum over symbols of `|position_qty * avg_cost|`.
    pub fn portfolio_notional(&self) -> u128 {
        self.per_symbol
            .values()
            .map(|s| s.quantity.unsigned_abs() * s.avg_cost)
            .sum()
    }
}

/// The pure, synchronous pre-trade risk check. Every check in
/// `validate` runs in a fixed order; the first failure determines the
/// rejection reason, returned as a human-readable `String` (the
/// embedder's control plane surfaces this verbatim in the resulting
/// `ExecutionReport`).
pub struct RiskValidator;

impl RiskValidator {
    /// `reference_price` is the order price for LIMIT, the latest
    /// last-price for MARKET; `None` when neither is available, in which
    /// case the portfolio-notional check degrades to using the order's own
    /// notional conservatively and proceeds rather than blocking the order.
    pub fn validate(
        request: &OrderRequest,
        snapshot: &LedgerSnapshot,
        config: &EngineConfig,
        now: u64,
        reference_price: Option<u128>,
    ) -> Result<(), String> {
        Self::check_well_formed(request, now)?;

        let caps = config.effective_risk_caps(&request.symbol);
        let quantity = narrow_to_u128(request.quantity);

        Self::check_order_size(quantity, caps.max_order_size)?;
        Self::check_daily_volume(
            &snapshot.symbol(&request.symbol),
            quantity,
            caps.max_daily_volume,
        )?;
        Self::check_position_cap(
            &snapshot.symbol(&request.symbol),
            request.side,
            quantity,
            caps.max_position_size,
        )?;
        Self::check_portfolio_notional(
            snapshot,
            quantity,
            reference_price,
            caps.max_portfolio_notional,
        )?;
        Self::check_daily_loss(
            snapshot,
            quantity,
            reference_price,
            config.order_loss_estimate_fraction,
            caps.max_daily_loss,
        )?;
        Self::check_trading_enabled(config)?;

        Ok(())
    }

    fn check_well_formed(request: &OrderRequest, now: u64) -> Result<(), String> {
        use crypto_bigint::Zero;

        if request.symbol.is_empty() {
            return Err("symbol must not be empty".to_string());
        }
        if bool::from(request.quantity.is_zero()) {
            return Err("quantity must be greater than zero".to_string());
        }
        match request.order_type {
            OrderType::Limit => {
                if bool::from(request.price.is_zero()) {
                    return Err("limit order price must be greater than zero".to_string());
                }
            }
            OrderType::Market => {
                if !bool::from(request.price.is_zero()) {
                    return Err("market order price must be exactly zero".to_string());
                }
            }
        }
        const ONE_DAY_MS: u64 = 24 * 60 * 60 * 1000;
        const ONE_MINUTE_MS: u64 = 60 * 1000;
        if now.saturating_sub(request.submitted_at) > ONE_DAY_MS {
            return Err("submission timestamp is too old".to_string());
        }
        if request.submitted_at.saturating_sub(now) > ONE_MINUTE_MS {
            return Err("submission timestamp is too far in the future".to_string());
        }
        Ok(())
    }

    fn check_order_size(quantity: u128, cap: Option<u128>) -> Result<(), String> {
        if let Some(cap) = cap {
            if quantity > cap {
                return Err(format!("Order size {quantity} exceeds maximum of {cap}"));
            }
        }
        Ok(())
    }

    fn check_daily_volume(
        symbol: &SymbolLedgerSnapshot,
        quantity: u128,
        cap: Option<u128>,
    ) -> Result<(), String> {
        if let Some(cap) = cap {
            let projected = symbol.daily_traded_volume + quantity;
            if projected > cap {
                return Err(format!(
                    "Daily traded volume {projected} would exceed maximum of {cap}"
                ));
            }
        }
        Ok(())
    }

    fn check_position_cap(
        symbol: &SymbolLedgerSnapshot,
        side: Side,
        quantity: u128,
        cap: Option<u128>,
    ) -> Result<(), String> {
        if let Some(cap) = cap {
            let signed = side.sign() * quantity as i128;
            let projected = (symbol.quantity + signed).unsigned_abs();
            if projected > cap {
                return Err(format!(
                    "Projected position {projected} would exceed maximum of {cap}"
                ));
            }
        }
        Ok(())
    }

    fn check_portfolio_notional(
        snapshot: &LedgerSnapshot,
        quantity: u128,
        reference_price: Option<u128>,
        cap: Option<u128>,
    ) -> Result<(), String> {
        let Some(cap) = cap else {
            return Ok(());
        };
        let order_notional = match reference_price {
            Some(price) => quantity * price,
            None => quantity,
        };
        let projected = snapshot.portfolio_notional() + order_notional;
        if projected > cap {
            return Err(format!(
                "Portfolio notional {projected} would exceed maximum of {cap}"
            ));
        }
        Ok(())
    }

    fn check_daily_loss(
        snapshot: &LedgerSnapshot,
        quantity: u128,
        reference_price: Option<u128>,
        estimate_fraction: f64,
        cap: Option<u128>,
    ) -> Result<(), String> {
        let Some(cap) = cap else {
            return Ok(());
        };
        let order_notional = reference_price.map(|p| quantity * p).unwrap_or(quantity);
        let estimated_order_risk = (order_notional as f64 * estimate_fraction) as i128;
        let projected_pnl =
            snapshot.daily_realized_pnl + snapshot.daily_unrealized_pnl - estimated_order_risk;
        if projected_pnl < -(cap as i128) {
            return Err(format!(
                "Projected daily P&L {projected_pnl} would breach loss cap of -{cap}"
            ));
        }
        Ok(())
    }

    fn check_trading_enabled(config: &EngineConfig) -> Result<(), String> {
        if !config.trading_enabled {
            return Err("Trading disabled".to_string());
        }
        Ok(())
    }
}
