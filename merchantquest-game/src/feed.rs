//! External price feed abstraction.
//!
//! The oracle treats the feed as a best-effort collaborator: a single read
//! attempt per query, with the caller deciding whether a failure is silent
//! (price queries) or loud (reference snapshots).
use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commodity::ReferenceAsset;

/// A single quote observed from the external feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReading {
    /// Quoted price in the feed's own integer units.
    pub price: i64,
    /// Unix timestamp the feed published this quote at.
    pub publish_time: u64,
}

/// Errors surfaced by a feed read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("feed unreachable")]
    Unavailable,
    #[error("no quote published for {0:?}")]
    UnknownAsset(ReferenceAsset),
    #[error("quote for {asset:?} is non-positive ({price})")]
    InvalidQuote { asset: ReferenceAsset, price: i64 },
}

/// Read-only provider of external reference quotes.
///
/// Implementations must not block or retry internally; one attempt per call.
pub trait PriceFeed {
    /// Read the current quote for an asset, or fail.
    fn read(&self, asset: ReferenceAsset) -> Result<FeedReading, FeedError>;
}

const DEFAULT_QUOTES: [(ReferenceAsset, i64); 4] = [
    (ReferenceAsset::Xau, 2_400),
    (ReferenceAsset::Eth, 3_000),
    (ReferenceAsset::Xag, 29),
    (ReferenceAsset::Wti, 78),
];

/// Fixed-quote feed for tests and offline tooling.
///
/// Quotes can be repointed and the whole feed marked unreachable to exercise
/// degradation paths.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    quotes: HashMap<ReferenceAsset, FeedReading>,
    available: bool,
}

impl StaticFeed {
    #[must_use]
    pub fn new() -> Self {
        let mut quotes = HashMap::new();
        for (asset, price) in DEFAULT_QUOTES {
            quotes.insert(
                asset,
                FeedReading {
                    price,
                    publish_time: 0,
                },
            );
        }
        Self {
            quotes,
            available: true,
        }
    }

    pub fn set_quote(&mut self, asset: ReferenceAsset, price: i64, publish_time: u64) {
        self.quotes.insert(
            asset,
            FeedReading {
                price,
                publish_time,
            },
        );
    }

    /// Toggle reachability; while unavailable every read fails.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }
}

impl Default for StaticFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeed for StaticFeed {
    fn read(&self, asset: ReferenceAsset) -> Result<FeedReading, FeedError> {
        if !self.available {
            return Err(FeedError::Unavailable);
        }
        let reading = self
            .quotes
            .get(&asset)
            .copied()
            .ok_or(FeedError::UnknownAsset(asset))?;
        if reading.price <= 0 {
            return Err(FeedError::InvalidQuote {
                asset,
                price: reading.price,
            });
        }
        Ok(reading)
    }
}

/// Random-walk feed for offline demos.
///
/// The walk only moves when [`SimulatedFeed::advance`] is called; reads are
/// pure so the oracle's one-read-per-query contract stays observable.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    quotes: HashMap<ReferenceAsset, FeedReading>,
    clock: u64,
}

impl SimulatedFeed {
    #[must_use]
    pub fn new() -> Self {
        let mut quotes = HashMap::new();
        // Walk in tenths so small percentage moves survive integer math.
        for (asset, price) in DEFAULT_QUOTES {
            quotes.insert(
                asset,
                FeedReading {
                    price: price * 10,
                    publish_time: 0,
                },
            );
        }
        Self { quotes, clock: 0 }
    }

    /// Step every asset by up to +/-2%, stamping quotes with a new time.
    pub fn advance(&mut self, rng: &mut impl Rng) {
        self.clock += 1;
        for reading in self.quotes.values_mut() {
            let step_bp: i64 = rng.gen_range(-200..=200);
            let moved = reading.price + reading.price * step_bp / 10_000;
            reading.price = moved.max(1);
            reading.publish_time = self.clock;
        }
    }
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeed for SimulatedFeed {
    fn read(&self, asset: ReferenceAsset) -> Result<FeedReading, FeedError> {
        self.quotes
            .get(&asset)
            .copied()
            .ok_or(FeedError::UnknownAsset(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn static_feed_degrades_when_marked_unavailable() {
        let mut feed = StaticFeed::new();
        assert!(feed.read(ReferenceAsset::Xau).is_ok());
        feed.set_available(false);
        assert_eq!(
            feed.read(ReferenceAsset::Xau),
            Err(FeedError::Unavailable)
        );
    }

    #[test]
    fn static_feed_rejects_non_positive_quotes() {
        let mut feed = StaticFeed::new();
        feed.set_quote(ReferenceAsset::Eth, 0, 10);
        assert!(matches!(
            feed.read(ReferenceAsset::Eth),
            Err(FeedError::InvalidQuote { .. })
        ));
    }

    #[test]
    fn simulated_walk_stays_positive_and_stamps_time() {
        let mut feed = SimulatedFeed::new();
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..500 {
            feed.advance(&mut rng);
        }
        for (asset, _) in DEFAULT_QUOTES {
            let reading = feed.read(asset).unwrap();
            assert!(reading.price > 0);
            assert_eq!(reading.publish_time, 500);
        }
    }
}
