//! Merchant records: identity, gold, cargo holdings, and trade statistics.
use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::commodity::{COMMODITY_COUNT, Commodity};
use crate::constants::{STARTING_CITY_INDEX, STARTING_GOLD};
use crate::travel::TravelState;

/// Opaque merchant identifier, unique within a world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MerchantId(u64);

impl MerchantId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MerchantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cargo position for one commodity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub quantity: u64,
    /// Running average purchase price; 0 while the holding is empty.
    pub avg_cost: u64,
}

/// One player's trading identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    /// Owner token (the wallet address in the deployed game).
    pub owner: String,
    pub gold: u64,
    pub holdings: [Holding; COMMODITY_COUNT],
    pub travel: TravelState,
    pub total_trades: u64,
    /// Realized profit across all sells; negative when selling at a loss.
    pub total_profit: i64,
    pub created_at: u64,
}

impl Merchant {
    /// A fresh merchant: home port, starting purse, empty hold.
    #[must_use]
    pub fn new(id: MerchantId, owner: &str, name: &str, now: u64) -> Self {
        let home = City::from_index(STARTING_CITY_INDEX).unwrap_or(City::Silverport);
        Self {
            id,
            name: name.to_string(),
            owner: owner.to_string(),
            gold: STARTING_GOLD,
            holdings: [Holding::default(); COMMODITY_COUNT],
            travel: TravelState::at_rest(home),
            total_trades: 0,
            total_profit: 0,
            created_at: now,
        }
    }

    #[must_use]
    pub const fn holding(&self, commodity: Commodity) -> Holding {
        self.holdings[commodity.index()]
    }

    /// Fold a purchase into the running average cost.
    pub(crate) fn record_buy(&mut self, commodity: Commodity, quantity: u64, unit_price: u64) {
        let holding = &mut self.holdings[commodity.index()];
        let prior = u128::from(holding.avg_cost) * u128::from(holding.quantity);
        let added = u128::from(unit_price) * u128::from(quantity);
        let total_qty = holding.quantity + quantity;
        if total_qty > 0 {
            let avg = (prior + added) / u128::from(total_qty);
            holding.avg_cost = u64::try_from(avg).unwrap_or(u64::MAX);
        }
        holding.quantity = total_qty;
        self.total_trades += 1;
    }

    /// Remove sold goods and realize profit against the average cost.
    /// Returns the realized profit for this sale.
    pub(crate) fn record_sell(&mut self, commodity: Commodity, quantity: u64, unit_price: u64) -> i64 {
        let holding = &mut self.holdings[commodity.index()];
        let proceeds = i128::from(unit_price) * i128::from(quantity);
        let cost_basis = i128::from(holding.avg_cost) * i128::from(quantity);
        let profit = i64::try_from(proceeds - cost_basis).unwrap_or(i64::MAX);
        holding.quantity -= quantity;
        if holding.quantity == 0 {
            holding.avg_cost = 0;
        }
        self.total_trades += 1;
        self.total_profit = self.total_profit.saturating_add(profit);
        profit
    }
}
