use crate::engine::risk::{LedgerSnapshot, SymbolLedgerSnapshot};
use crate::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// One symbol's running position: signed quantity, volume-weighted average
/// cost, and the realized/unrealized P&L it has accrued today.
#[derive(Clone, Debug)]
pub struct Position {
    pub symbol: Arc<str>,
    pub quantity: i128,
    pub avg_cost: u128,
    pub realized_pnl: i128,
    pub unrealized_pnl: i128,
    pub daily_traded_volume: u128,
    pub last_update: u64,
}

impl Position {
    pub fn new(symbol: impl Into<Arc<str>>, now: u64) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: 0,
            avg_cost: 0,
            realized_pnl: 0,
            unrealized_pnl: 0,
            daily_traded_volume: 0,
            last_update: now,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    pub fn is_long(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_short(&self) -> bool {
        self.quantity < 0
    }

    pub fn market_value(&self, current_price: u128) -> i128 {
        self.quantity * current_price as i128
    }

    /// Folds one fill into the position. `signed_quantity` is positive for a
    /// buy fill and negative for a sell fill; `price` is the fill price.
    /// Mirrors the closing/reducing/reversing/opening cases of the
    /// teacher's volume-weighted position tracker: a same-direction add
    /// blends into `avg_cost`, an opposite-direction fill realizes P&L on
    /// the closing portion and only resets `avg_cost` if the position
    /// flips sign, and a fill that exactly flattens the position zeroes
    /// `avg_cost` while leaving `realized_pnl` untouched.
    pub fn apply_fill(&mut self, signed_quantity: i128, price: u128, now: u64) {
        debug_assert!(signed_quantity != 0, "a fill must have nonzero quantity");

        self.daily_traded_volume += signed_quantity.unsigned_abs();
        let current_quantity = self.quantity;
        let new_total_quantity = current_quantity + signed_quantity;

        let is_reducing = (current_quantity > 0 && signed_quantity < 0)
            || (current_quantity < 0 && signed_quantity > 0);

        if is_reducing {
            let closing_quantity = signed_quantity.unsigned_abs().min(current_quantity.unsigned_abs());
            let price = price as i128;
            let avg_cost = self.avg_cost as i128;
            if current_quantity > 0 {
                self.realized_pnl += closing_quantity as i128 * (price - avg_cost);
            } else {
                self.realized_pnl += closing_quantity as i128 * (avg_cost - price);
            }

            self.quantity = new_total_quantity;
            if new_total_quantity == 0 {
                self.avg_cost = 0;
            } else if (current_quantity > 0 && new_total_quantity < 0)
                || (current_quantity < 0 && new_total_quantity > 0)
            {
                self.avg_cost = price as u128;
            }
            // else: reduced but same direction, avg_cost unchanged.
        } else if current_quantity == 0 {
            self.quantity = signed_quantity;
            self.avg_cost = price;
        } else {
            let blended_notional = current_quantity.unsigned_abs() * self.avg_cost
                + signed_quantity.unsigned_abs() * price;
            self.quantity = new_total_quantity;
            self.avg_cost = blended_notional / new_total_quantity.unsigned_abs();
        }

        self.last_update = now;
    }

    pub fn mark_to_market(&mut self, current_price: u128, now: u64) {
        self.unrealized_pnl = if self.quantity != 0 && self.avg_cost > 0 && current_price > 0 {
            self.quantity * (current_price as i128 - self.avg_cost as i128)
        } else {
            0
        };
        self.last_update = now;
    }

    /// Flattens the position administratively (e.g. an operator-triggered
    /// close), preserving `realized_pnl` as the historical record of what
    /// this position has already earned or lost.
    pub fn flatten(&mut self, now: u64) {
        self.quantity = 0;
        self.avg_cost = 0;
        self.unrealized_pnl = 0;
        self.last_update = now;
    }

    /// Daily roll resets the day's realized P&L and traded-volume counters;
    /// the running quantity and avg_cost survive unchanged across days.
    pub fn roll_daily(&mut self, now: u64) {
        self.realized_pnl = 0;
        self.daily_traded_volume = 0;
        self.last_update = now;
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            quantity: self.quantity,
            avg_cost: self.avg_cost,
            realized_pnl: self.realized_pnl,
            last_update: self.last_update,
        }
    }
}

/// PositionLedger is the per-symbol position book for the whole engine. It
/// is read by the risk validator (via `snapshot`) and written by the
/// matching worker as trades are produced.
pub struct PositionLedger {
    positions: RwLock<HashMap<Arc<str>, Position>>,
}

impl Default for PositionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionLedger {
    pub fn new() -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
        }
    }

    /// Applies one fill (role-agnostic: the caller passes the signed
    /// quantity from that side's perspective) and returns the resulting
    /// snapshot for observer notification.
    pub fn apply_fill(
        &self,
        symbol: &Arc<str>,
        signed_quantity: i128,
        price: u128,
        now: u64,
    ) -> PositionSnapshot {
        let mut positions = self.positions.write().expect("position ledger poisoned");
        let position = positions
            .entry(symbol.clone())
            .or_insert_with(|| Position::new(symbol.clone(), now));
        position.apply_fill(signed_quantity, price, now);
        position.snapshot()
    }

    pub fn mark_to_market(&self, symbol: &str, current_price: u128, now: u64) -> Option<PositionSnapshot> {
        let mut positions = self.positions.write().expect("position ledger poisoned");
        let position = positions.get_mut(symbol)?;
        position.mark_to_market(current_price, now);
        Some(position.snapshot())
    }

    pub fn get(&self, symbol: &str) -> Option<PositionSnapshot> {
        let positions = self.positions.read().expect("position ledger poisoned");
        positions.get(symbol).map(Position::snapshot)
    }

    pub fn all(&self) -> Vec<PositionSnapshot> {
        let positions = self.positions.read().expect("position ledger poisoned");
        positions.values().map(Position::snapshot).collect()
    }

    pub fn flatten(&self, symbol: &str, now: u64) -> Option<PositionSnapshot> {
        let mut positions = self.positions.write().expect("position ledger poisoned");
        let position = positions.get_mut(symbol)?;
        position.flatten(now);
        Some(position.snapshot())
    }

    /// Resets every symbol's daily counters. Invoked only by the explicit
    /// `trigger_daily_roll` facade operation, never on a timer.
    pub fn roll_daily(&self, now: u64) -> Vec<PositionSnapshot> {
        let mut positions = self.positions.write().expect("position ledger poisoned");
        positions
            .values_mut()
            .map(|position| {
                position.roll_daily(now);
                position.snapshot()
            })
            .collect()
    }

    /// Builds the consistent view the risk validator consumes for one
    /// `validate` call.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let positions = self.positions.read().expect("position ledger poisoned");
        let mut daily_realized_pnl = 0i128;
        let mut daily_unrealized_pnl = 0i128;
        let mut per_symbol = HashMap::with_capacity(positions.len());
        for (symbol, position) in positions.iter() {
            daily_realized_pnl += position.realized_pnl;
            daily_unrealized_pnl += position.unrealized_pnl;
            per_symbol.insert(
                symbol.clone(),
                SymbolLedgerSnapshot {
                    quantity: position.quantity,
                    avg_cost: position.avg_cost,
                    daily_traded_volume: position.daily_traded_volume,
                },
            );
        }
        LedgerSnapshot {
            per_symbol,
            daily_realized_pnl,
            daily_unrealized_pnl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_fill_sets_quantity_and_avg_cost() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        assert_eq!(position.quantity, 100);
        assert_eq!(position.avg_cost, 10);
        assert_eq!(position.realized_pnl, 0);
    }

    #[test]
    fn same_direction_fill_blends_avg_cost_by_volume() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.apply_fill(100, 20, 2);
        assert_eq!(position.quantity, 200);
        assert_eq!(position.avg_cost, 15, "volume-weighted blend of 100@10 and 100@20");
    }

    #[test]
    fn reducing_fill_realizes_pnl_and_keeps_avg_cost() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.apply_fill(-40, 15, 2);
        assert_eq!(position.quantity, 60);
        assert_eq!(position.avg_cost, 10, "avg_cost unchanged when reducing without flipping");
        assert_eq!(position.realized_pnl, 200, "40 units closed at a 5 profit each");
    }

    #[test]
    fn flipping_fill_realizes_pnl_on_closed_portion_and_resets_avg_cost() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.apply_fill(-150, 20, 2);
        assert_eq!(position.quantity, -50);
        assert_eq!(position.avg_cost, 20, "flip reprices avg_cost at the flipping fill");
        assert_eq!(position.realized_pnl, 1000, "100 units closed at a 10 profit each");
    }

    #[test]
    fn exact_flatten_zeroes_avg_cost_but_keeps_realized_pnl() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.apply_fill(-100, 12, 2);
        assert_eq!(position.quantity, 0);
        assert_eq!(position.avg_cost, 0);
        assert_eq!(position.realized_pnl, 200);
    }

    #[test]
    fn mark_to_market_zero_when_flat() {
        let mut position = Position::new("AAPL", 0);
        position.mark_to_market(100, 1);
        assert_eq!(position.unrealized_pnl, 0);
    }

    #[test]
    fn mark_to_market_zero_when_mark_is_not_positive() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.mark_to_market(0, 2);
        assert_eq!(position.unrealized_pnl, 0, "a non-positive mark must not produce P&L");
    }

    #[test]
    fn mark_to_market_computes_unrealized_pnl_for_open_position() {
        let mut position = Position::new("AAPL", 0);
        position.apply_fill(100, 10, 1);
        position.mark_to_market(15, 2);
        assert_eq!(position.unrealized_pnl, 500);
    }
}
