//! Travel state machine.
//!
//! A merchant is either at rest in a city or in transit with a fixed
//! arrival time. Completion is a second explicit step after the timer
//! elapses, so the machine is built to recover cleanly when that step is
//! missed (client crashed, tab closed, transaction dropped).
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::city::{CITY_COUNT, City};
use crate::constants::{DEFAULT_TRAVEL_SECS, TRAVEL_LEGS};

/// Where a merchant is, authoritatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TravelState {
    AtRest {
        city: City,
    },
    Traveling {
        from: City,
        to: City,
        /// Unix timestamp at or after which completion is permitted.
        arrival_time: u64,
    },
}

/// Point-in-time answer to "where is this merchant and can they act".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelStatus {
    pub is_traveling: bool,
    pub from_city: City,
    pub to_city: City,
    /// Seconds until arrival; 0 when at rest or already arrived.
    pub time_remaining: u64,
}

/// Errors raised by travel operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TravelError {
    #[error("no merchant registered under id {0}")]
    UnknownMerchant(u64),
    #[error("caller does not own merchant {0}")]
    Unauthorized(u64),
    #[error("city index {0} out of range")]
    InvalidCity(usize),
    #[error("already in {0}")]
    NoOpTravel(City),
    #[error("travel costs {needed} gold but only {available} available")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("merchant is already on the road")]
    AlreadyTraveling,
    #[error("still traveling, {remaining}s until arrival")]
    StillTraveling { remaining: u64 },
    #[error("merchant is not traveling")]
    NotTraveling,
}

/// Seconds to travel a directed city pair.
///
/// The leg table is kept exactly as tabulated upstream; unlisted pairs get
/// the flat default so a trip can always be priced and completed.
#[must_use]
pub fn travel_duration(from: City, to: City) -> u64 {
    TRAVEL_LEGS
        .iter()
        .find(|(leg_from, leg_to, _)| *leg_from == from.index() && *leg_to == to.index())
        .map_or(DEFAULT_TRAVEL_SECS, |(_, _, secs)| *secs)
}

impl TravelState {
    /// Fresh merchants start at rest in their home city.
    #[must_use]
    pub const fn at_rest(city: City) -> Self {
        Self::AtRest { city }
    }

    /// Authoritative city while at rest; destination while in transit is
    /// not yet a location.
    #[must_use]
    pub const fn current_city(&self) -> Option<City> {
        match self {
            Self::AtRest { city } => Some(*city),
            Self::Traveling { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_traveling(&self) -> bool {
        matches!(self, Self::Traveling { .. })
    }

    /// Begin a trip. Valid only at rest, to a real, different city.
    ///
    /// Funds are checked by the owning ledger before this commits; the
    /// state machine itself only validates the route.
    pub fn start(&mut self, to_city: usize, now: u64) -> Result<City, TravelError> {
        let Self::AtRest { city } = *self else {
            return Err(TravelError::AlreadyTraveling);
        };
        if to_city >= CITY_COUNT {
            return Err(TravelError::InvalidCity(to_city));
        }
        let destination = match City::from_index(to_city) {
            Some(destination) if destination != city => destination,
            Some(_) => return Err(TravelError::NoOpTravel(city)),
            None => return Err(TravelError::InvalidCity(to_city)),
        };
        let arrival_time = now + travel_duration(city, destination);
        *self = Self::Traveling {
            from: city,
            to: destination,
            arrival_time,
        };
        Ok(destination)
    }

    /// Finish a trip once the arrival time has passed.
    ///
    /// Repeated calls after the first success return [`TravelError::NotTraveling`],
    /// a benign signal that lets any number of recovering clients race the
    /// completion without corrupting state.
    pub fn complete(&mut self, now: u64) -> Result<City, TravelError> {
        let Self::Traveling {
            to, arrival_time, ..
        } = *self
        else {
            return Err(TravelError::NotTraveling);
        };
        if now < arrival_time {
            return Err(TravelError::StillTraveling {
                remaining: arrival_time - now,
            });
        }
        *self = Self::AtRest { city: to };
        Ok(to)
    }

    /// Pure status snapshot. While at rest the from/to fields echo the
    /// current city and are not meaningful.
    #[must_use]
    pub fn status(&self, now: u64) -> TravelStatus {
        match *self {
            Self::AtRest { city } => TravelStatus {
                is_traveling: false,
                from_city: city,
                to_city: city,
                time_remaining: 0,
            },
            Self::Traveling {
                from,
                to,
                arrival_time,
            } => TravelStatus {
                is_traveling: true,
                from_city: from,
                to_city: to,
                time_remaining: arrival_time.saturating_sub(now),
            },
        }
    }
}
