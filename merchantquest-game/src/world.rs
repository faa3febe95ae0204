//! The world service: single-writer owner of the oracle, the city catalog,
//! and every merchant record.
//!
//! All mutation funnels through `&mut self` methods, so operations are
//! totally ordered and either commit fully or leave no trace. Records for
//! different merchants never conflict structurally; they simply share the
//! same serialized writer.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::city::{City, apply_bp};
use crate::commodity::{COMMODITY_COUNT, Commodity};
use crate::constants::{BUY_MARKUP_BP, SELL_PAYOUT_BP};
use crate::feed::PriceFeed;
use crate::merchant::{Merchant, MerchantId};
use crate::oracle::PriceOracle;
use crate::travel::{TravelError, TravelState, TravelStatus};

/// Which side of the market a quote is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Errors raised by merchant registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("owner {0} already has a merchant")]
    MerchantExists(String),
    #[error("merchant name must not be empty")]
    EmptyName,
}

/// Errors raised by buy/sell operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("no merchant registered under id {0}")]
    UnknownMerchant(u64),
    #[error("caller does not own merchant {0}")]
    Unauthorized(u64),
    #[error("trade quantity must be positive")]
    InvalidQuantity,
    #[error("cannot trade while traveling")]
    CannotTradeWhileTraveling,
    #[error("trade costs {needed} gold but only {available} available")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("holding {available} {commodity} but tried to sell {needed}")]
    InsufficientGoods {
        commodity: Commodity,
        needed: u64,
        available: u64,
    },
}

/// Settlement summary returned by a successful buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub commodity: Commodity,
    pub quantity: u64,
    pub unit_price: u64,
    pub total: u64,
    /// Realized profit; zero for buys.
    pub profit: i64,
}

/// Authoritative game state.
#[derive(Debug, Clone)]
pub struct World<F: PriceFeed> {
    oracle: PriceOracle<F>,
    merchants: BTreeMap<MerchantId, Merchant>,
    owners: BTreeMap<String, MerchantId>,
    next_merchant: u64,
}

impl<F: PriceFeed> World<F> {
    #[must_use]
    pub fn new(feed: F) -> Self {
        Self {
            oracle: PriceOracle::new(feed),
            merchants: BTreeMap::new(),
            owners: BTreeMap::new(),
            next_merchant: 1,
        }
    }

    #[must_use]
    pub const fn oracle(&self) -> &PriceOracle<F> {
        &self.oracle
    }

    /// Mutable oracle access. This is the privileged operator surface;
    /// restricting who reaches it is the embedding's responsibility.
    pub const fn oracle_mut(&mut self) -> &mut PriceOracle<F> {
        &mut self.oracle
    }

    // ---- merchants ------------------------------------------------------

    /// Register a merchant for an owner. One merchant per owner.
    pub fn create_merchant(
        &mut self,
        owner: &str,
        name: &str,
        now: u64,
    ) -> Result<MerchantId, WorldError> {
        if name.trim().is_empty() {
            return Err(WorldError::EmptyName);
        }
        if self.owners.contains_key(owner) {
            return Err(WorldError::MerchantExists(owner.to_string()));
        }
        let id = MerchantId::new(self.next_merchant);
        self.next_merchant += 1;
        self.merchants
            .insert(id, Merchant::new(id, owner, name, now));
        self.owners.insert(owner.to_string(), id);
        log::info!("merchant {id} '{name}' created for {owner}");
        Ok(id)
    }

    #[must_use]
    pub fn merchant(&self, id: MerchantId) -> Option<&Merchant> {
        self.merchants.get(&id)
    }

    #[must_use]
    pub fn merchant_by_owner(&self, owner: &str) -> Option<&Merchant> {
        self.owners.get(owner).and_then(|id| self.merchants.get(id))
    }

    pub fn merchants(&self) -> impl Iterator<Item = &Merchant> {
        self.merchants.values()
    }

    // ---- travel ---------------------------------------------------------

    /// Begin travel to a destination city, debiting the travel cost.
    ///
    /// Every precondition is checked before any mutation: a rejected trip
    /// leaves gold and location untouched.
    pub fn start_travel(
        &mut self,
        owner: &str,
        id: MerchantId,
        to_city: usize,
        now: u64,
    ) -> Result<TravelStatus, TravelError> {
        let merchant = owned_merchant(&mut self.merchants, owner, id)?;
        let TravelState::AtRest { city } = merchant.travel else {
            return Err(TravelError::AlreadyTraveling);
        };
        let destination =
            City::from_index(to_city).ok_or(TravelError::InvalidCity(to_city))?;
        if destination == city {
            return Err(TravelError::NoOpTravel(city));
        }
        let cost = destination.info().travel_cost;
        if merchant.gold < cost {
            return Err(TravelError::InsufficientFunds {
                needed: cost,
                available: merchant.gold,
            });
        }
        merchant.gold -= cost;
        merchant.travel.start(to_city, now)?;
        let status = merchant.travel.status(now);
        log::info!(
            "merchant {id} departed {city} for {destination} ({}s, {cost} gold)",
            status.time_remaining
        );
        Ok(status)
    }

    /// Finish an in-flight trip whose arrival time has passed.
    pub fn complete_travel(
        &mut self,
        owner: &str,
        id: MerchantId,
        now: u64,
    ) -> Result<City, TravelError> {
        let merchant = owned_merchant(&mut self.merchants, owner, id)?;
        let city = merchant.travel.complete(now)?;
        log::info!("merchant {id} arrived in {city}");
        Ok(city)
    }

    /// Authoritative travel snapshot for any merchant.
    pub fn get_travel_status(
        &self,
        id: MerchantId,
        now: u64,
    ) -> Result<TravelStatus, TravelError> {
        let merchant = self
            .merchants
            .get(&id)
            .ok_or(TravelError::UnknownMerchant(id.get()))?;
        Ok(merchant.travel.status(now))
    }

    /// Trading is only allowed at rest.
    pub fn can_trade(&self, id: MerchantId) -> Result<bool, TravelError> {
        let merchant = self
            .merchants
            .get(&id)
            .ok_or(TravelError::UnknownMerchant(id.get()))?;
        Ok(!merchant.travel.is_traveling())
    }

    // ---- trading --------------------------------------------------------

    /// Quote for one commodity in one city: oracle price, regional modifier,
    /// then the market spread for the requested side.
    #[must_use]
    pub fn city_price(&self, city: City, commodity: Commodity, side: TradeSide) -> u64 {
        let market = apply_bp(self.oracle.price_of(commodity), city.price_mod_bp(commodity));
        match side {
            TradeSide::Buy => apply_bp(market, BUY_MARKUP_BP),
            TradeSide::Sell => apply_bp(market, SELL_PAYOUT_BP),
        }
    }

    /// Buy and sell quotes for all commodities in one city.
    #[must_use]
    pub fn all_city_prices(
        &self,
        city: City,
    ) -> ([u64; COMMODITY_COUNT], [u64; COMMODITY_COUNT]) {
        let buys = Commodity::ALL.map(|c| self.city_price(city, c, TradeSide::Buy));
        let sells = Commodity::ALL.map(|c| self.city_price(city, c, TradeSide::Sell));
        (buys, sells)
    }

    /// Buy goods at the merchant's current city.
    pub fn buy(
        &mut self,
        owner: &str,
        id: MerchantId,
        commodity: Commodity,
        quantity: u64,
    ) -> Result<TradeReceipt, TradeError> {
        let (city, gold) = self.trading_position(owner, id, quantity)?;
        let unit_price = self.city_price(city, commodity, TradeSide::Buy);
        let total = unit_price.saturating_mul(quantity);
        if gold < total {
            return Err(TradeError::InsufficientFunds {
                needed: total,
                available: gold,
            });
        }
        let merchant = self
            .merchants
            .get_mut(&id)
            .ok_or(TradeError::UnknownMerchant(id.get()))?;
        merchant.gold -= total;
        merchant.record_buy(commodity, quantity, unit_price);
        log::debug!("merchant {id} bought {quantity} {commodity} at {unit_price} in {city}");
        Ok(TradeReceipt {
            commodity,
            quantity,
            unit_price,
            total,
            profit: 0,
        })
    }

    /// Sell goods at the merchant's current city.
    pub fn sell(
        &mut self,
        owner: &str,
        id: MerchantId,
        commodity: Commodity,
        quantity: u64,
    ) -> Result<TradeReceipt, TradeError> {
        let (city, _) = self.trading_position(owner, id, quantity)?;
        let unit_price = self.city_price(city, commodity, TradeSide::Sell);
        let total = unit_price.saturating_mul(quantity);
        let merchant = self
            .merchants
            .get_mut(&id)
            .ok_or(TradeError::UnknownMerchant(id.get()))?;
        let held = merchant.holding(commodity).quantity;
        if held < quantity {
            return Err(TradeError::InsufficientGoods {
                commodity,
                needed: quantity,
                available: held,
            });
        }
        merchant.gold = merchant.gold.saturating_add(total);
        let profit = merchant.record_sell(commodity, quantity, unit_price);
        log::debug!(
            "merchant {id} sold {quantity} {commodity} at {unit_price} in {city} (profit {profit})"
        );
        Ok(TradeReceipt {
            commodity,
            quantity,
            unit_price,
            total,
            profit,
        })
    }

    /// Shared buy/sell preamble: auth, positive quantity, and at-rest check.
    /// Returns the merchant's city and gold without holding a borrow.
    fn trading_position(
        &mut self,
        owner: &str,
        id: MerchantId,
        quantity: u64,
    ) -> Result<(City, u64), TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity);
        }
        let merchant = match owned_merchant(&mut self.merchants, owner, id) {
            Ok(merchant) => merchant,
            Err(TravelError::UnknownMerchant(raw)) => {
                return Err(TradeError::UnknownMerchant(raw));
            }
            Err(_) => return Err(TradeError::Unauthorized(id.get())),
        };
        let Some(city) = merchant.travel.current_city() else {
            return Err(TradeError::CannotTradeWhileTraveling);
        };
        Ok((city, merchant.gold))
    }
}

/// Look up a merchant and verify the caller owns it.
fn owned_merchant<'a>(
    merchants: &'a mut BTreeMap<MerchantId, Merchant>,
    owner: &str,
    id: MerchantId,
) -> Result<&'a mut Merchant, TravelError> {
    let merchant = merchants
        .get_mut(&id)
        .ok_or(TravelError::UnknownMerchant(id.get()))?;
    if merchant.owner != owner {
        return Err(TravelError::Unauthorized(id.get()));
    }
    Ok(merchant)
}
