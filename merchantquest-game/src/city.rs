//! The four-city world map: catalog data, travel costs, and the regional
//! price modifiers that make trade routes profitable.
use serde::{Deserialize, Serialize};

use crate::commodity::{COMMODITY_COUNT, Commodity};
use crate::constants::{BP_SCALE, TRAVEL_COSTS};

/// Number of cities on the map. Fixed at deployment.
pub const CITY_COUNT: usize = 4;

/// A city on the world map, identified on the wire by index 0-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Silverport,
    Goldmere,
    Silkwind,
    Ironhold,
}

/// Static catalog entry for a city.
#[derive(Debug, Clone, Serialize)]
pub struct CityInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// Gold debited to travel *to* this city.
    pub travel_cost: u64,
    /// Per-commodity price modifier in basis points (10,000 = neutral).
    pub price_mods_bp: [u32; COMMODITY_COUNT],
}

impl City {
    /// All cities in index order.
    pub const ALL: [Self; CITY_COUNT] = [
        Self::Silverport,
        Self::Goldmere,
        Self::Silkwind,
        Self::Ironhold,
    ];

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Silverport),
            1 => Some(Self::Goldmere),
            2 => Some(Self::Silkwind),
            3 => Some(Self::Ironhold),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Catalog data for this city.
    ///
    /// Modifiers mirror each city's specialty: Goldmere mines gold but
    /// imports grain, Silkwind weaves silk and craves iron, Ironhold smelts
    /// iron and pays up for luxuries, Silverport trades at par.
    #[must_use]
    pub const fn info(self) -> CityInfo {
        match self {
            Self::Silverport => CityInfo {
                name: "Silverport",
                description: "A bustling trade hub where merchants from all lands gather.",
                travel_cost: TRAVEL_COSTS[0],
                price_mods_bp: [10_000, 10_000, 10_000, 10_000, 10_000],
            },
            Self::Goldmere => CityInfo {
                name: "Goldmere",
                description: "Mountain city rich in precious metals but lacking farmland.",
                travel_cost: TRAVEL_COSTS[1],
                price_mods_bp: [8_000, 13_000, 10_000, 10_500, 10_000],
            },
            Self::Silkwind => CityInfo {
                name: "Silkwind",
                description: "Eastern city famous for its silk weavers and spice markets.",
                travel_cost: TRAVEL_COSTS[2],
                price_mods_bp: [10_000, 11_000, 7_500, 8_000, 13_000],
            },
            Self::Ironhold => CityInfo {
                name: "Ironhold",
                description: "Fortress city with vast mines and fertile plains.",
                travel_cost: TRAVEL_COSTS[3],
                price_mods_bp: [11_500, 8_500, 12_000, 12_000, 7_500],
            },
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.info().name
    }

    /// Regional modifier for a commodity, in basis points.
    #[must_use]
    pub const fn price_mod_bp(self, commodity: Commodity) -> u32 {
        self.info().price_mods_bp[commodity.index()]
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Apply a basis-point modifier to a price, flooring at 1.
#[must_use]
pub(crate) fn apply_bp(price: u64, modifier_bp: u32) -> u64 {
    let scaled = u128::from(price) * u128::from(modifier_bp) / u128::from(BP_SCALE);
    u64::try_from(scaled).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_specialties() {
        // Goldmere: cheap gold, expensive wheat.
        assert!(City::Goldmere.price_mod_bp(Commodity::Gold) < BP_SCALE);
        assert!(City::Goldmere.price_mod_bp(Commodity::Wheat) > BP_SCALE);
        // Silkwind: cheap silk and spices, dear iron.
        assert!(City::Silkwind.price_mod_bp(Commodity::Silk) < BP_SCALE);
        assert!(City::Silkwind.price_mod_bp(Commodity::Iron) > BP_SCALE);
        // Silverport trades at par across the board.
        for commodity in Commodity::ALL {
            assert_eq!(City::Silverport.price_mod_bp(commodity), BP_SCALE);
        }
    }

    #[test]
    fn travel_to_the_home_port_is_free() {
        assert_eq!(City::Silverport.info().travel_cost, 0);
        assert!(City::Goldmere.info().travel_cost > 0);
    }

    #[test]
    fn apply_bp_floors_at_one() {
        assert_eq!(apply_bp(1, 1), 1);
        assert_eq!(apply_bp(100, 11_000), 110);
        assert_eq!(apply_bp(100, 9_000), 90);
    }
}
