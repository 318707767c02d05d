//! Time sources and the same-day edit window.
//!
//! Civil dates are computed in a fixed reference zone rather than the
//! device zone, so a session keeps logging against the same calendar day
//! when the device travels across a midnight boundary.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::Session;

/// Zone that anchors "today" unless configured otherwise.
pub const DEFAULT_REFERENCE_ZONE: Tz = chrono_tz::America::Los_Angeles;

/// Injected source of the current instant and civil date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Zone used to turn instants into civil dates.
    fn zone(&self) -> Tz;

    /// Today's civil date in the reference zone.
    fn today(&self) -> NaiveDate {
        civil_date(self.now(), self.zone())
    }
}

/// Civil date of `instant` as seen from `zone`.
pub fn civil_date(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

/// Wall clock anchored to a fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: Tz,
}

impl SystemClock {
    pub const fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(DEFAULT_REFERENCE_ZONE)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn zone(&self) -> Tz {
        self.zone
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    zone: Tz,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            now: Mutex::new(now),
            zone,
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn zone(&self) -> Tz {
        self.zone
    }
}

/// When new ends or shots may be appended to a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditWindow {
    /// Only while the session date is today in the reference zone
    #[default]
    SameDay,
    /// Any time
    Unrestricted,
}

impl EditWindow {
    pub fn check_append(self, session: &Session, today: NaiveDate) -> Result<(), ValidationError> {
        match self {
            Self::Unrestricted => Ok(()),
            Self::SameDay if session.session_date == today => Ok(()),
            Self::SameDay => Err(ValidationError::EditWindowClosed {
                session_date: session.session_date.to_string(),
                today: today.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn civil_date_uses_reference_zone_not_utc() {
        // 06:30 UTC on the 10th is still the evening of the 9th in Los Angeles.
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 6, 30, 0).unwrap();
        assert_eq!(
            civil_date(instant, DEFAULT_REFERENCE_ZONE),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
        assert_eq!(
            civil_date(instant, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }

    #[test]
    fn fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        let clock = FixedClock::new(start, DEFAULT_REFERENCE_ZONE);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        clock.advance(chrono::Duration::hours(12));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn same_day_window_rejects_past_sessions() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 20, 0, 0).unwrap();
        let today = civil_date(now, DEFAULT_REFERENCE_ZONE);
        let session = Session::new_draft(today, now, 5);
        let tomorrow = today.succ_opt().unwrap();

        assert!(EditWindow::SameDay.check_append(&session, today).is_ok());
        assert!(matches!(
            EditWindow::SameDay.check_append(&session, tomorrow),
            Err(ValidationError::EditWindowClosed { .. })
        ));
        assert!(EditWindow::Unrestricted
            .check_append(&session, tomorrow)
            .is_ok());
    }
}
