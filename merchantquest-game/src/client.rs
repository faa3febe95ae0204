//! Client-side travel recovery: the advisory shadow cache, the
//! reconciliation protocol, and a poll-driven status watcher.
//!
//! The cache exists only to restore a countdown UI after a reload. It is
//! never the source of truth; every entry must pass through [`reconcile`]
//! against the authoritative travel status before being shown as fact.
use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::commodity::COMMODITY_COUNT;
use crate::feed::PriceFeed;
use crate::merchant::MerchantId;
use crate::travel::{TravelError, TravelStatus};
use crate::world::World;

/// Storage key clients persist the cache entry under.
pub const TRAVEL_CACHE_KEY: &str = "merchantquest_travel_state";

/// Client-side lifecycle of a trip, as last seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelPhase {
    Idle,
    Starting,
    Traveling,
    Completing,
}

/// Advisory record of an in-flight trip, persisted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelCacheEntry {
    pub merchant_id: MerchantId,
    pub destination: City,
    pub start_time: u64,
    pub duration: u64,
    pub phase: TravelPhase,
}

impl TravelCacheEntry {
    /// Seconds this entry believes remain; advisory only.
    #[must_use]
    pub const fn remaining(&self, now: u64) -> u64 {
        (self.start_time + self.duration).saturating_sub(now)
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from storage; a corrupt entry is simply absent.
    #[must_use]
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// What a reconnecting client should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Arrival time has passed; attempt `complete_travel` immediately.
    CompleteNow { destination: City },
    /// Still in transit; resume the countdown and schedule completion.
    ResumeCountdown { destination: City, remaining: u64 },
    /// Not traveling; any cached entry is stale and must be dropped.
    DiscardCache,
    /// Not traveling and nothing cached; nothing to do.
    Idle,
}

/// Reconcile a (possibly stale, possibly missing) cache entry against the
/// authoritative travel status.
///
/// The authoritative status alone decides the action; the cache only
/// determines whether there is anything to discard. An entry cached for a
/// different merchant is treated as stale.
#[must_use]
pub fn reconcile(
    cache: Option<&TravelCacheEntry>,
    merchant: MerchantId,
    status: &TravelStatus,
) -> Recovery {
    if status.is_traveling {
        if status.time_remaining == 0 {
            return Recovery::CompleteNow {
                destination: status.to_city,
            };
        }
        return Recovery::ResumeCountdown {
            destination: status.to_city,
            remaining: status.time_remaining,
        };
    }
    match cache {
        Some(entry) => {
            if entry.merchant_id != merchant {
                log::debug!(
                    "discarding travel cache for {} while reconciling {merchant}",
                    entry.merchant_id
                );
            }
            Recovery::DiscardCache
        }
        None => Recovery::Idle,
    }
}

/// Poll-driven observer over one merchant's travel status and the global
/// price board.
///
/// `poll` never blocks; the caller owns the cadence. Arrived-but-
/// uncompleted trips are healed in place, so any polling client un-sticks
/// them, including one that never started the trip.
pub struct StatusWatcher {
    owner: String,
    merchant: MerchantId,
    last_status: Option<TravelStatus>,
    last_prices: Option<[u64; COMMODITY_COUNT]>,
    on_travel: Option<Box<dyn FnMut(&TravelStatus)>>,
    on_prices: Option<Box<dyn FnMut(&[u64; COMMODITY_COUNT])>>,
}

impl StatusWatcher {
    #[must_use]
    pub fn new(owner: &str, merchant: MerchantId) -> Self {
        Self {
            owner: owner.to_string(),
            merchant,
            last_status: None,
            last_prices: None,
            on_travel: None,
            on_prices: None,
        }
    }

    /// Invoke the callback whenever the observed travel status changes.
    pub fn on_travel_change(&mut self, callback: impl FnMut(&TravelStatus) + 'static) {
        self.on_travel = Some(Box::new(callback));
    }

    /// Invoke the callback whenever any derived price changes.
    pub fn on_price_change(&mut self, callback: impl FnMut(&[u64; COMMODITY_COUNT]) + 'static) {
        self.on_prices = Some(Box::new(callback));
    }

    /// One observation cycle: fetch status, auto-heal if arrived, fetch
    /// prices, and fire change callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error only if the merchant is unknown; travel races are
    /// absorbed (another client completing first is the protocol working).
    pub fn poll<F: PriceFeed>(
        &mut self,
        world: &mut World<F>,
        now: u64,
    ) -> Result<TravelStatus, TravelError> {
        let mut status = world.get_travel_status(self.merchant, now)?;

        if status.is_traveling && status.time_remaining == 0 {
            match world.complete_travel(&self.owner, self.merchant, now) {
                Ok(city) => {
                    log::info!("watcher healed stuck travel for {}: arrived {city}", self.merchant);
                }
                Err(TravelError::NotTraveling) => {
                    // Another client won the race; benign.
                }
                Err(err) => {
                    log::warn!("auto-heal for {} failed: {err}", self.merchant);
                }
            }
            status = world.get_travel_status(self.merchant, now)?;
        }

        if self.last_status != Some(status) {
            if let Some(callback) = self.on_travel.as_mut() {
                callback(&status);
            }
            self.last_status = Some(status);
        }

        let prices = world.oracle().get_all_prices();
        if self.last_prices != Some(prices) {
            if let Some(callback) = self.on_prices.as_mut() {
                callback(&prices);
            }
            self.last_prices = Some(prices);
        }

        Ok(status)
    }
}

impl std::fmt::Debug for StatusWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusWatcher")
            .field("owner", &self.owner)
            .field("merchant", &self.merchant)
            .field("last_status", &self.last_status)
            .field("last_prices", &self.last_prices)
            .finish_non_exhaustive()
    }
}
