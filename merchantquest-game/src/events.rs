//! Narrative market events and procedural trend scenarios.
//!
//! Events shock a subset of commodities with fixed modifiers; scenarios
//! produce a full trend array, optionally randomized. Both settle through
//! the oracle's normal replace semantics.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::commodity::COMMODITY_COUNT;
use crate::constants::TREND_NEUTRAL_BP;
use crate::feed::PriceFeed;
use crate::oracle::{OracleError, PriceOracle};

/// A scripted market shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameEvent {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub commodity_ids: &'static [usize],
    pub modifiers_bp: &'static [u32],
}

/// The deployed event catalog.
pub const GAME_EVENTS: &[GameEvent] = &[
    GameEvent {
        key: "dragon",
        name: "Dragon Attack!",
        description: "A dragon has attacked the trade routes! Luxury goods are scarce.",
        commodity_ids: &[2, 3],
        modifiers_bp: &[15_000, 15_000],
    },
    GameEvent {
        key: "bountiful-harvest",
        name: "Bountiful Harvest",
        description: "Excellent weather has led to a record harvest. Wheat is abundant!",
        commodity_ids: &[1],
        modifiers_bp: &[7_000],
    },
    GameEvent {
        key: "gold-discovery",
        name: "Gold Vein Discovered",
        description: "Miners have discovered a massive gold vein in the mountains!",
        commodity_ids: &[0],
        modifiers_bp: &[7_500],
    },
    GameEvent {
        key: "pirate-raid",
        name: "Pirate Raid",
        description: "Pirates have raided coastal warehouses. Iron weapons are in high demand!",
        commodity_ids: &[4],
        modifiers_bp: &[14_000],
    },
    GameEvent {
        key: "festival",
        name: "Royal Festival",
        description: "The kingdom celebrates! Demand for luxuries has skyrocketed.",
        commodity_ids: &[0, 2, 3],
        modifiers_bp: &[12_000, 13_000, 12_000],
    },
    GameEvent {
        key: "reset",
        name: "Market Stabilization",
        description: "Markets have returned to normal conditions.",
        commodity_ids: &[0, 1, 2, 3, 4],
        modifiers_bp: &[10_000, 10_000, 10_000, 10_000, 10_000],
    },
];

impl GameEvent {
    /// Look up an event by its catalog key.
    #[must_use]
    pub fn by_key(key: &str) -> Option<&'static Self> {
        GAME_EVENTS.iter().find(|event| event.key == key)
    }

    /// Apply this event through the oracle.
    pub fn apply<F: PriceFeed>(&self, oracle: &mut PriceOracle<F>) -> Result<(), OracleError> {
        oracle.trigger_game_event(self.name, self.description, self.commodity_ids, self.modifiers_bp)
    }
}

/// Preset market-wide trend generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketScenario {
    /// Independent moves of up to +/-10% per commodity.
    Normal,
    /// Everything up 5-15%.
    Bull,
    /// Everything down 5-15%.
    Bear,
    GoldRush,
    Harvest,
    War,
    TradeDisruption,
}

impl MarketScenario {
    pub const ALL: [Self; 7] = [
        Self::Normal,
        Self::Bull,
        Self::Bear,
        Self::GoldRush,
        Self::Harvest,
        Self::War,
        Self::TradeDisruption,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bull => "bull",
            Self::Bear => "bear",
            Self::GoldRush => "gold-rush",
            Self::Harvest => "harvest",
            Self::War => "war",
            Self::TradeDisruption => "trade-disruption",
        }
    }

    #[must_use]
    pub fn by_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|scenario| scenario.key() == key)
    }

    /// Produce the trend array this scenario applies.
    #[must_use]
    pub fn trends_bp(self, rng: &mut impl Rng) -> [u32; COMMODITY_COUNT] {
        match self {
            Self::Normal => random_trends(rng, -1_000, 1_000),
            Self::Bull => random_trends(rng, 500, 1_500),
            Self::Bear => {
                let mut trends = random_trends(rng, 500, 1_500);
                for trend in &mut trends {
                    *trend = 2 * TREND_NEUTRAL_BP - *trend;
                }
                trends
            }
            Self::GoldRush => [15_000, 10_000, 10_000, 10_000, 10_000],
            Self::Harvest => [10_000, 7_500, 10_000, 10_000, 10_000],
            Self::War => [11_000, 12_000, 8_000, 10_000, 15_000],
            Self::TradeDisruption => [10_000, 10_000, 14_000, 14_000, 10_000],
        }
    }
}

fn random_trends(rng: &mut impl Rng, low_bp: i32, high_bp: i32) -> [u32; COMMODITY_COUNT] {
    let mut trends = [TREND_NEUTRAL_BP; COMMODITY_COUNT];
    for trend in &mut trends {
        let change = rng.gen_range(low_bp..=high_bp);
        let shifted = TREND_NEUTRAL_BP as i32 + change;
        *trend = u32::try_from(shifted).unwrap_or(TREND_NEUTRAL_BP);
    }
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TREND_MAX_BP, TREND_MIN_BP};
    use crate::feed::StaticFeed;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn catalog_events_apply_cleanly() {
        let mut oracle = PriceOracle::new(StaticFeed::new());
        for event in GAME_EVENTS {
            event.apply(&mut oracle).unwrap();
        }
        // The catalog ends with the stabilization event, so trends are
        // neutral again.
        assert_eq!(
            GameEvent::by_key("reset").unwrap().apply(&mut oracle),
            Ok(())
        );
        let prices = oracle.get_all_prices();
        for (price, commodity) in prices.iter().zip(crate::Commodity::ALL) {
            assert_eq!(*price, commodity.base_price());
        }
    }

    #[test]
    fn unknown_event_key_is_absent() {
        assert!(GameEvent::by_key("dragon").is_some());
        assert!(GameEvent::by_key("comet").is_none());
    }

    #[test]
    fn scenarios_stay_inside_the_operator_band() {
        let mut rng = SmallRng::seed_from_u64(1_337);
        for scenario in MarketScenario::ALL {
            for _ in 0..100 {
                for trend in scenario.trends_bp(&mut rng) {
                    assert!((TREND_MIN_BP..=TREND_MAX_BP).contains(&trend));
                }
            }
        }
    }

    #[test]
    fn bear_mirrors_bull_below_neutral() {
        let mut rng = SmallRng::seed_from_u64(7);
        for trend in MarketScenario::Bear.trends_bp(&mut rng) {
            assert!(trend < TREND_NEUTRAL_BP);
            assert!(trend >= TREND_NEUTRAL_BP - 1_500);
        }
    }

    #[test]
    fn scenario_keys_round_trip() {
        for scenario in MarketScenario::ALL {
            assert_eq!(MarketScenario::by_key(scenario.key()), Some(scenario));
        }
        assert_eq!(MarketScenario::by_key("sideways"), None);
    }
}
