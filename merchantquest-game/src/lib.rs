//! MerchantQuest Core Engine
//!
//! Platform-agnostic game logic for the MerchantQuest trading game: the
//! price oracle engine, the travel state machine, and the world service
//! that ties merchants, cities, and trading together. This crate has no UI,
//! no wallet plumbing, and no network transport; those live in the
//! embedding and call in through the interfaces exposed here.

pub mod city;
pub mod client;
pub mod commodity;
pub mod constants;
pub mod events;
pub mod feed;
pub mod merchant;
pub mod oracle;
pub mod travel;
pub mod world;

// Re-export commonly used types
pub use city::{CITY_COUNT, City, CityInfo};
pub use client::{
    Recovery, StatusWatcher, TRAVEL_CACHE_KEY, TravelCacheEntry, TravelPhase, reconcile,
};
pub use commodity::{COMMODITY_COUNT, Commodity, ReferenceAsset};
pub use constants::{BP_SCALE, TREND_MAX_BP, TREND_MIN_BP, TREND_NEUTRAL_BP};
pub use events::{GAME_EVENTS, GameEvent, MarketScenario};
pub use feed::{FeedError, FeedReading, PriceFeed, SimulatedFeed, StaticFeed};
pub use merchant::{Holding, Merchant, MerchantId};
pub use oracle::{OracleError, PriceBreakdown, PriceOracle, PriceState};
pub use travel::{TravelError, TravelState, TravelStatus, travel_duration};
pub use world::{TradeError, TradeReceipt, TradeSide, World, WorldError};
