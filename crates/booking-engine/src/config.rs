//! Scheduling constants and practice-level configuration.
//!
//! Every advance-notice, buffer, and granularity rule the engines apply comes
//! from one [`SchedulingConfig`] value, so the availability engine and the
//! policy gates can never disagree on the numbers.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::types::{hhmm, minute_of_day};

/// Minimum lead time before a slot may be booked.
pub const MIN_ADVANCE_HOURS: i64 = 24;
/// Gap enforced before and after every appointment.
pub const BUFFER_MINUTES: i64 = 15;
/// Spacing of candidate slot starts within an availability window.
pub const SLOT_GRANULARITY_MINUTES: i64 = 15;
/// Session length assumed when an appointment's service is unknown.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Opening span for one kind of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpan {
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
}

impl DaySpan {
    /// Whether a session starting at `start` fits entirely inside the span.
    pub fn admits(&self, start: NaiveTime, duration: Duration) -> bool {
        let start_min = minute_of_day(start);
        start_min >= minute_of_day(self.open)
            && start_min + duration.num_minutes() <= minute_of_day(self.close)
    }
}

/// Practice opening hours used to gate reschedule targets.
///
/// Weekdays and Saturdays carry their own spans; the practice is closed on
/// Sundays.
///
/// These spans are independent of the [`AvailabilityWindow`] records that
/// drive slot generation, and nothing keeps the two in step. Windows remain
/// authoritative for what is bookable; this table only rejects reschedule
/// targets that fall outside opening hours.
///
/// [`AvailabilityWindow`]: crate::types::AvailabilityWindow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub weekday: DaySpan,
    pub saturday: DaySpan,
}

impl BusinessHours {
    /// Check a proposed session against opening hours.
    ///
    /// Returns the violation to report, or `None` when the session both
    /// starts and ends inside the day's span.
    pub fn violation(&self, start: DateTime<Utc>, duration: Duration) -> Option<HoursViolation> {
        match start.weekday() {
            Weekday::Sun => Some(HoursViolation::ClosedSunday),
            Weekday::Sat => (!self.saturday.admits(start.time(), duration))
                .then_some(HoursViolation::OutsideSaturday(self.saturday)),
            _ => (!self.weekday.admits(start.time(), duration))
                .then_some(HoursViolation::OutsideWeekday(self.weekday)),
        }
    }
}

/// Why a proposed time falls outside practice hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoursViolation {
    ClosedSunday,
    OutsideWeekday(DaySpan),
    OutsideSaturday(DaySpan),
}

impl fmt::Display for HoursViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoursViolation::ClosedSunday => f.write_str("We are closed on Sundays"),
            HoursViolation::OutsideWeekday(span) => write!(
                f,
                "Appointments must be between {} and {} on weekdays",
                span.open.format("%H:%M"),
                span.close.format("%H:%M"),
            ),
            HoursViolation::OutsideSaturday(span) => write!(
                f,
                "Appointments must be between {} and {} on Saturdays",
                span.open.format("%H:%M"),
                span.close.format("%H:%M"),
            ),
        }
    }
}

/// The single source of truth for scheduling rules.
///
/// [`SchedulingConfig::default`] carries the practice's canonical numbers;
/// deserializing a partial document fills the gaps from those defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Minimum lead time, in hours, before a slot may be booked.
    pub min_advance_hours: i64,
    /// Gap, in minutes, enforced before and after every appointment.
    pub buffer_minutes: i64,
    /// Spacing, in minutes, between candidate slot starts.
    pub slot_granularity_minutes: i64,
    /// Session length, in minutes, assumed when a service is unknown.
    pub default_duration_minutes: u32,
    /// Opening hours applied to reschedule targets.
    pub business_hours: BusinessHours,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        SchedulingConfig {
            min_advance_hours: MIN_ADVANCE_HOURS,
            buffer_minutes: BUFFER_MINUTES,
            slot_granularity_minutes: SLOT_GRANULARITY_MINUTES,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            business_hours: BusinessHours {
                weekday: DaySpan {
                    open: hm(9, 0),
                    close: hm(17, 0),
                },
                saturday: DaySpan {
                    open: hm(10, 0),
                    close: hm(14, 0),
                },
            },
        }
    }
}

impl SchedulingConfig {
    /// Reject configurations the slot walk cannot safely run under.
    pub fn validate(&self) -> Result<()> {
        if self.slot_granularity_minutes < 1 {
            return Err(BookingError::InvalidConfig(
                "slot granularity must be at least one minute".to_owned(),
            ));
        }
        if self.buffer_minutes < 0 {
            return Err(BookingError::InvalidConfig(
                "buffer cannot be negative".to_owned(),
            ));
        }
        if self.min_advance_hours < 0 {
            return Err(BookingError::InvalidConfig(
                "advance notice cannot be negative".to_owned(),
            ));
        }
        if self.default_duration_minutes < 1 {
            return Err(BookingError::InvalidConfig(
                "default duration must be at least one minute".to_owned(),
            ));
        }
        let spans = [
            ("weekday", self.business_hours.weekday),
            ("Saturday", self.business_hours.saturday),
        ];
        for (label, span) in spans {
            if span.open >= span.close {
                return Err(BookingError::InvalidConfig(format!(
                    "{label} hours open at or after they close"
                )));
            }
        }
        Ok(())
    }
}

fn hm(hour: i64, minute: i64) -> NaiveTime {
    NaiveTime::MIN + Duration::hours(hour) + Duration::minutes(minute)
}
