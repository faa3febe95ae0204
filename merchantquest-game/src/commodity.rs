//! The fixed commodity set and its external reference-asset mapping.
use serde::{Deserialize, Serialize};

use crate::constants::BASE_PRICES;

/// Number of tradable commodities. Fixed at deployment.
pub const COMMODITY_COUNT: usize = 5;

/// One of the five tradable goods, identified on the wire by index 0-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commodity {
    Gold,
    Wheat,
    Silk,
    Spices,
    Iron,
}

/// External feed asset a commodity's price drifts with.
///
/// The game pegs fantasy goods to real-world quotes: gold tracks spot gold,
/// silk and wheat ride ETH, spices track silver, iron tracks oil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceAsset {
    Xau,
    Eth,
    Xag,
    Wti,
}

impl Commodity {
    /// All commodities in index order.
    pub const ALL: [Self; COMMODITY_COUNT] = [
        Self::Gold,
        Self::Wheat,
        Self::Silk,
        Self::Spices,
        Self::Iron,
    ];

    /// Resolve a raw index, as used by callers addressing commodities 0-4.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Gold),
            1 => Some(Self::Wheat),
            2 => Some(Self::Silk),
            3 => Some(Self::Spices),
            4 => Some(Self::Iron),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Wheat => "Wheat",
            Self::Silk => "Silk",
            Self::Spices => "Spices",
            Self::Iron => "Iron",
        }
    }

    /// Static reference price in gold.
    #[must_use]
    pub const fn base_price(self) -> u64 {
        BASE_PRICES[self.index()]
    }

    /// Which external quote this commodity blends against.
    #[must_use]
    pub const fn reference_asset(self) -> ReferenceAsset {
        match self {
            Self::Gold => ReferenceAsset::Xau,
            Self::Wheat | Self::Silk => ReferenceAsset::Eth,
            Self::Spices => ReferenceAsset::Xag,
            Self::Iron => ReferenceAsset::Wti,
        }
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_all_commodities() {
        for commodity in Commodity::ALL {
            assert_eq!(Commodity::from_index(commodity.index()), Some(commodity));
        }
        assert_eq!(Commodity::from_index(COMMODITY_COUNT), None);
    }

    #[test]
    fn wheat_and_silk_share_the_eth_proxy() {
        assert_eq!(Commodity::Wheat.reference_asset(), ReferenceAsset::Eth);
        assert_eq!(Commodity::Silk.reference_asset(), ReferenceAsset::Eth);
        assert_eq!(Commodity::Gold.reference_asset(), ReferenceAsset::Xau);
    }
}
