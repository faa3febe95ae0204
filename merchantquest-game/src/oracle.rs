//! Price oracle engine.
//!
//! Each commodity's market price blends a static base price, an
//! operator-steered trend multiplier, and (when enabled) the amplified drift
//! of an external reference quote since the last snapshot. Queries never
//! fail on feed trouble; they quietly fall back to the trend-only price.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commodity::{COMMODITY_COUNT, Commodity};
use crate::constants::{
    BP_SCALE, DEFAULT_VOLATILITY_AMP_BP, PRICE_FLOOR, TREND_MAX_BP, TREND_MIN_BP, TREND_NEUTRAL_BP,
};
use crate::feed::{FeedError, PriceFeed};

/// Pricing inputs held per commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceState {
    /// Static reference price in gold.
    pub base_price: u64,
    /// Operator trend multiplier in basis points (10,000 = neutral).
    pub trend_bp: u32,
    /// Feed quote captured by the last reference snapshot; 0 until one runs.
    pub reference_feed_price: i64,
}

/// Diagnostic decomposition of one derived price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub final_price: u64,
    pub base_price: u64,
    pub trend_bp: u32,
    /// Amplified feed delta in basis points; zero whenever fallback applied.
    pub feed_delta_bp: i64,
    /// Whether this particular derivation used the fallback path, either by
    /// configuration or by silent degradation.
    pub using_fallback: bool,
}

/// Errors raised by oracle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("commodity index {0} out of range")]
    InvalidCommodity(usize),
    #[error("trend {value} bp for commodity {index} outside 1000..=50000")]
    TrendOutOfRange { index: usize, value: u32 },
    #[error("amplifier {value} bp outside 1000..=50000")]
    AmplifierOutOfRange { value: u32 },
    #[error("event names {commodities} commodities but carries {modifiers} modifiers")]
    ArityMismatch {
        commodities: usize,
        modifiers: usize,
    },
    #[error("reference snapshot requires a live feed: {0}")]
    FeedUnavailable(#[from] FeedError),
}

/// The oracle service. All mutation funnels through `&mut self` methods, so
/// trend updates and snapshots are serialized and all-or-nothing.
#[derive(Debug, Clone)]
pub struct PriceOracle<F: PriceFeed> {
    feed: F,
    states: [PriceState; COMMODITY_COUNT],
    using_fallback: bool,
    volatility_amp_bp: u32,
}

impl<F: PriceFeed> PriceOracle<F> {
    /// Create an oracle over a feed. Blending starts disabled; an operator
    /// enables it once the feed is confirmed healthy.
    #[must_use]
    pub fn new(feed: F) -> Self {
        let states = Commodity::ALL.map(|commodity| PriceState {
            base_price: commodity.base_price(),
            trend_bp: TREND_NEUTRAL_BP,
            reference_feed_price: 0,
        });
        Self {
            feed,
            states,
            using_fallback: true,
            volatility_amp_bp: DEFAULT_VOLATILITY_AMP_BP,
        }
    }

    #[must_use]
    pub const fn feed(&self) -> &F {
        &self.feed
    }

    pub const fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    #[must_use]
    pub const fn using_fallback(&self) -> bool {
        self.using_fallback
    }

    #[must_use]
    pub const fn volatility_amplifier_bp(&self) -> u32 {
        self.volatility_amp_bp
    }

    /// Pricing inputs for one commodity.
    #[must_use]
    pub const fn state(&self, commodity: Commodity) -> PriceState {
        self.states[commodity.index()]
    }

    /// Derived price for a commodity addressed by raw index.
    pub fn get_price(&self, commodity_id: usize) -> Result<u64, OracleError> {
        let commodity = Commodity::from_index(commodity_id)
            .ok_or(OracleError::InvalidCommodity(commodity_id))?;
        Ok(self.price_of(commodity))
    }

    /// Derived prices for every commodity, in index order.
    #[must_use]
    pub fn get_all_prices(&self) -> [u64; COMMODITY_COUNT] {
        Commodity::ALL.map(|commodity| self.price_of(commodity))
    }

    /// Diagnostic breakdown for a commodity addressed by raw index.
    pub fn get_price_breakdown(&self, commodity_id: usize) -> Result<PriceBreakdown, OracleError> {
        let commodity = Commodity::from_index(commodity_id)
            .ok_or(OracleError::InvalidCommodity(commodity_id))?;
        Ok(self.breakdown_of(commodity))
    }

    /// Derived price for a commodity. Never fails and never returns zero.
    #[must_use]
    pub fn price_of(&self, commodity: Commodity) -> u64 {
        self.breakdown_of(commodity).final_price
    }

    /// Full derivation for a commodity.
    ///
    /// The blended path only applies when fallback mode is off, the
    /// commodity has a reference snapshot, and the feed answers with a
    /// positive quote; any other outcome degrades to the trend-only price
    /// for this call without surfacing an error.
    #[must_use]
    pub fn breakdown_of(&self, commodity: Commodity) -> PriceBreakdown {
        let state = self.states[commodity.index()];
        let trend_component =
            i128::from(state.base_price) * i128::from(state.trend_bp) / i128::from(BP_SCALE);

        if !self.using_fallback && state.reference_feed_price > 0 {
            match self.feed.read(commodity.reference_asset()) {
                Ok(reading) if reading.price > 0 => {
                    let reference = i128::from(state.reference_feed_price);
                    let delta_bp =
                        (i128::from(reading.price) - reference) * i128::from(BP_SCALE) / reference;
                    let amplified_bp =
                        delta_bp * i128::from(self.volatility_amp_bp) / i128::from(BP_SCALE);
                    let blended =
                        trend_component * (i128::from(BP_SCALE) + amplified_bp) / i128::from(BP_SCALE);
                    return PriceBreakdown {
                        final_price: floor_price(blended),
                        base_price: state.base_price,
                        trend_bp: state.trend_bp,
                        feed_delta_bp: i64::try_from(amplified_bp).unwrap_or(i64::MAX),
                        using_fallback: false,
                    };
                }
                Ok(reading) => {
                    log::debug!(
                        "ignoring non-positive feed quote {} for {commodity}",
                        reading.price
                    );
                }
                Err(err) => {
                    log::debug!("feed read failed for {commodity}, using fallback: {err}");
                }
            }
        }

        PriceBreakdown {
            final_price: floor_price(trend_component),
            base_price: state.base_price,
            trend_bp: state.trend_bp,
            feed_delta_bp: 0,
            using_fallback: true,
        }
    }

    /// Replace the trend multiplier for all commodities at once.
    ///
    /// Validation runs over the whole array before any write, so one bad
    /// entry leaves every trend untouched.
    pub fn update_oracle_trends(
        &mut self,
        trends_bp: [u32; COMMODITY_COUNT],
    ) -> Result<(), OracleError> {
        for (index, &value) in trends_bp.iter().enumerate() {
            check_trend(index, value)?;
        }
        for (state, trend_bp) in self.states.iter_mut().zip(trends_bp) {
            state.trend_bp = trend_bp;
        }
        log::info!("oracle trends updated to {trends_bp:?}");
        Ok(())
    }

    /// Apply a narrative event: replace the trend multiplier for a subset of
    /// commodities. Functionally a partial [`Self::update_oracle_trends`].
    pub fn trigger_game_event(
        &mut self,
        name: &str,
        description: &str,
        commodity_ids: &[usize],
        modifiers_bp: &[u32],
    ) -> Result<(), OracleError> {
        if commodity_ids.len() != modifiers_bp.len() {
            return Err(OracleError::ArityMismatch {
                commodities: commodity_ids.len(),
                modifiers: modifiers_bp.len(),
            });
        }
        for (&id, &value) in commodity_ids.iter().zip(modifiers_bp) {
            Commodity::from_index(id).ok_or(OracleError::InvalidCommodity(id))?;
            check_trend(id, value)?;
        }
        for (&id, &value) in commodity_ids.iter().zip(modifiers_bp) {
            self.states[id].trend_bp = value;
        }
        log::info!("game event '{name}' applied: {description}");
        Ok(())
    }

    /// Toggle whether queries attempt external-feed blending.
    pub fn set_fallback_mode(&mut self, enabled: bool) {
        if self.using_fallback != enabled {
            log::info!("oracle fallback mode set to {enabled}");
        }
        self.using_fallback = enabled;
    }

    /// Change how strongly feed moves are exaggerated into game prices.
    pub fn set_volatility_amplifier(&mut self, amp_bp: u32) -> Result<(), OracleError> {
        if !(TREND_MIN_BP..=TREND_MAX_BP).contains(&amp_bp) {
            return Err(OracleError::AmplifierOutOfRange { value: amp_bp });
        }
        self.volatility_amp_bp = amp_bp;
        Ok(())
    }

    /// Snapshot the current feed quote for every commodity, resetting the
    /// baseline future deltas are measured against.
    ///
    /// Unlike queries, this operation requires a fresh reading and aborts
    /// with no partial snapshot if any asset cannot be read.
    pub fn update_reference_prices(&mut self) -> Result<(), OracleError> {
        let mut snapshot = [0_i64; COMMODITY_COUNT];
        for commodity in Commodity::ALL {
            let reading = self.feed.read(commodity.reference_asset())?;
            snapshot[commodity.index()] = reading.price;
        }
        for (state, price) in self.states.iter_mut().zip(snapshot) {
            state.reference_feed_price = price;
        }
        log::info!("reference prices snapshotted: {snapshot:?}");
        Ok(())
    }
}

const fn check_trend(index: usize, value: u32) -> Result<(), OracleError> {
    if value < TREND_MIN_BP || value > TREND_MAX_BP {
        return Err(OracleError::TrendOutOfRange { index, value });
    }
    Ok(())
}

fn floor_price(value: i128) -> u64 {
    if value < i128::from(PRICE_FLOOR) {
        return PRICE_FLOOR;
    }
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::ReferenceAsset;
    use crate::feed::StaticFeed;

    fn blended_oracle() -> PriceOracle<StaticFeed> {
        let mut oracle = PriceOracle::new(StaticFeed::new());
        oracle.update_reference_prices().unwrap();
        oracle.set_fallback_mode(false);
        oracle
    }

    #[test]
    fn neutral_trend_reproduces_base_prices_in_fallback() {
        let oracle = PriceOracle::new(StaticFeed::new());
        for commodity in Commodity::ALL {
            assert_eq!(oracle.price_of(commodity), commodity.base_price());
        }
    }

    #[test]
    fn ten_percent_feed_move_triples_into_the_price() {
        let mut oracle = blended_oracle();
        // XAU 2400 -> 2640 is +10%; amplified 3x that is +30%.
        oracle
            .feed_mut()
            .set_quote(ReferenceAsset::Xau, 2_640, 1);
        let breakdown = oracle.breakdown_of(Commodity::Gold);
        assert!(!breakdown.using_fallback);
        assert_eq!(breakdown.feed_delta_bp, 3_000);
        assert_eq!(breakdown.final_price, 130);
    }

    #[test]
    fn crash_beyond_the_floor_clamps_to_one() {
        let mut oracle = blended_oracle();
        // -50% amplified 3x would price gold at -50 gold; the floor holds.
        oracle
            .feed_mut()
            .set_quote(ReferenceAsset::Xau, 1_200, 1);
        assert_eq!(oracle.price_of(Commodity::Gold), 1);
    }

    #[test]
    fn unsnapshotted_commodity_ignores_blending() {
        let mut oracle = PriceOracle::new(StaticFeed::new());
        oracle.set_fallback_mode(false);
        let breakdown = oracle.breakdown_of(Commodity::Gold);
        assert!(breakdown.using_fallback);
        assert_eq!(breakdown.final_price, Commodity::Gold.base_price());
    }

    #[test]
    fn snapshot_aborts_whole_when_feed_is_down() {
        let mut oracle = PriceOracle::new(StaticFeed::new());
        oracle.feed_mut().set_available(false);
        let err = oracle.update_reference_prices().unwrap_err();
        assert!(matches!(err, OracleError::FeedUnavailable(_)));
        for commodity in Commodity::ALL {
            assert_eq!(oracle.state(commodity).reference_feed_price, 0);
        }
    }

    #[test]
    fn amplifier_band_is_enforced() {
        let mut oracle = PriceOracle::new(StaticFeed::new());
        assert!(oracle.set_volatility_amplifier(20_000).is_ok());
        assert!(oracle.set_volatility_amplifier(60_000).is_err());
        assert_eq!(oracle.volatility_amplifier_bp(), 20_000);
    }

    #[test]
    fn invalid_commodity_index_is_rejected() {
        let oracle = PriceOracle::new(StaticFeed::new());
        assert_eq!(
            oracle.get_price(5),
            Err(OracleError::InvalidCommodity(5))
        );
        assert!(oracle.get_price_breakdown(9).is_err());
    }
}
