//! Civil-date sources for release stamping.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Reference zone used when none is configured.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::Chicago;

/// Supplies "today" as a calendar date.
///
/// Release dates are civil dates in a reference time zone, so the same
/// release renders the same date regardless of the host's local time zone.
pub trait DateProvider {
    fn today(&self) -> NaiveDate;
}

/// Wall clock pinned to an IANA time zone, daylight saving included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    zone: Tz,
}

impl ReferenceClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Civil date of `instant` in the reference zone.
    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_ZONE)
    }
}

impl DateProvider for ReferenceClock {
    fn today(&self) -> NaiveDate {
        self.date_at(Utc::now())
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDate(pub NaiveDate);

impl DateProvider for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
