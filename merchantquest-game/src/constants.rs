//! Centralized balance and tuning constants for MerchantQuest core logic.
//!
//! These values define the deterministic math for pricing and travel.
//! Keeping them together ensures the economy can only be adjusted via code
//! changes reviewed in version control.

// Basis-point math ---------------------------------------------------------
/// 10,000 basis points = 100%.
pub const BP_SCALE: u32 = 10_000;
/// Neutral trend multiplier.
pub const TREND_NEUTRAL_BP: u32 = BP_SCALE;
/// Lowest trend multiplier an operator may set (-90%).
pub const TREND_MIN_BP: u32 = 1_000;
/// Highest trend multiplier an operator may set (+400%).
pub const TREND_MAX_BP: u32 = 50_000;
/// Default volatility amplification applied to feed moves (3x).
pub const DEFAULT_VOLATILITY_AMP_BP: u32 = 30_000;
/// Derived prices never fall below this floor.
pub const PRICE_FLOOR: u64 = 1;

// Commodity base prices ----------------------------------------------------
pub(crate) const BASE_PRICES: [u64; 5] = [100, 25, 60, 45, 30];

// Market spread ------------------------------------------------------------
/// Markup charged on top of the city price when a merchant buys.
pub(crate) const BUY_MARKUP_BP: u32 = 11_000;
/// Payout fraction of the city price when a merchant sells.
pub(crate) const SELL_PAYOUT_BP: u32 = 9_000;

// Merchants ----------------------------------------------------------------
pub(crate) const STARTING_GOLD: u64 = 1_000;
pub(crate) const STARTING_CITY_INDEX: usize = 0;

// Travel -------------------------------------------------------------------
/// Gold debited per destination city (indexed by destination).
pub(crate) const TRAVEL_COSTS: [u64; 4] = [0, 60, 80, 70];
/// Duration used for any from/to pair missing from the tabulated legs.
pub(crate) const DEFAULT_TRAVEL_SECS: u64 = 5;

/// Directed travel legs in seconds. Pairs absent from this table fall back
/// to [`DEFAULT_TRAVEL_SECS`]; the table is kept as tabulated upstream and
/// is not assumed symmetric.
pub(crate) const TRAVEL_LEGS: &[(usize, usize, u64)] = &[
    (0, 1, 5),
    (0, 2, 8),
    (0, 3, 6),
    (1, 0, 5),
    (1, 2, 10),
    (1, 3, 7),
    (2, 0, 8),
    (2, 1, 10),
    (2, 3, 7),
    (3, 0, 6),
    (3, 1, 7),
    (3, 2, 7),
];
