//! Candidate slot grids and bookability checks.
//!
//! Walks a day's active availability windows at the configured granularity to
//! produce the full candidate grid (every candidate labelled available or
//! not), and answers point queries for a single proposed start time with the
//! precise reason a slot cannot be booked.
//!
//! Both paths evaluate against the same snapshot and clock. The grid walks
//! the whole window and labels every candidate; the point check validates
//! one concrete start against the full rule chain, including that the
//! session ends inside the window.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};

use crate::config::SchedulingConfig;
use crate::conflict;
use crate::error::{BookingError, Result};
use crate::types::CalendarSnapshot;

/// One candidate start in a day's slot grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub available: bool,
    /// Why the slot cannot be booked; `None` when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SlotRejection>,
}

/// Verdict for a single proposed start time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SlotRejection>,
}

impl SlotCheck {
    fn ok() -> Self {
        SlotCheck {
            available: true,
            reason: None,
        }
    }

    fn rejected(reason: SlotRejection) -> Self {
        SlotCheck {
            available: false,
            reason: Some(reason),
        }
    }
}

/// Why a candidate or proposed slot cannot be booked.
///
/// Serializes as its display string, which is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRejection {
    /// Grid label: the candidate is closer than the advance-notice floor.
    InsufficientNotice,
    /// Grid label: the candidate collides with an occupied appointment.
    Taken,
    /// The slot collides with an administrative block.
    Blocked,
    /// The requested service does not exist or is inactive.
    ServiceUnavailable,
    /// The start time falls outside every active availability window.
    OutsideHours,
    /// The start time is closer than the minimum advance notice.
    AdvanceNotice { hours: i64 },
    /// The slot collides with another client's appointment.
    Conflict,
    /// The slot collides with the requesting client's own appointment.
    OwnConflict,
}

impl fmt::Display for SlotRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRejection::InsufficientNotice => f.write_str("Insufficient advance notice"),
            SlotRejection::Taken => f.write_str("Time slot unavailable"),
            SlotRejection::Blocked => f.write_str("Time slot blocked"),
            SlotRejection::ServiceUnavailable => f.write_str("Service not found or inactive"),
            SlotRejection::OutsideHours => f.write_str("Outside business hours"),
            SlotRejection::AdvanceNotice { hours } => {
                write!(f, "Must be booked at least {hours} hours in advance")
            }
            SlotRejection::Conflict => {
                f.write_str("Time slot conflicts with existing appointment")
            }
            SlotRejection::OwnConflict => {
                f.write_str("You already have an appointment at this time")
            }
        }
    }
}

impl Serialize for SlotRejection {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Generate the full candidate grid for one day.
///
/// Every active window on the date's weekday is walked at the configured
/// granularity; each candidate is labelled available or carries the reason it
/// is not. Windows too short to hold the service contribute no candidates at
/// all. Candidates are returned in chronological window order.
///
/// Passing `service_id: None` sizes sessions at the configured default
/// duration. A service id that is missing or inactive is a hard error, unlike
/// the point check below, because a grid for an unknown service is
/// meaningless rather than merely unavailable.
///
/// # Arguments
///
/// * `date` — The day to enumerate (UTC).
/// * `service_id` — Service to size sessions for, or `None` for the default.
/// * `snapshot` — Calendar state to evaluate against.
/// * `config` — Scheduling rules; validated before the walk.
/// * `now` — The clock, passed explicitly so results are reproducible.
pub fn day_slots(
    date: NaiveDate,
    service_id: Option<&str>,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>> {
    config.validate()?;

    let duration = match service_id {
        Some(id) => snapshot
            .active_service(id)
            .ok_or_else(|| BookingError::ServiceNotFound(id.to_owned()))?
            .duration(),
        None => Duration::minutes(i64::from(config.default_duration_minutes)),
    };

    let step = Duration::minutes(config.slot_granularity_minutes);
    let mut slots = Vec::new();
    for window in snapshot.active_windows_on(date.weekday()) {
        // A window too short to hold one session contributes nothing.
        if window.span() < duration {
            continue;
        }
        let window_end = date.and_time(window.end).and_utc();
        let mut cursor = date.and_time(window.start).and_utc();
        while cursor < window_end {
            slots.push(evaluate(cursor, duration, snapshot, config, now));
            cursor += step;
        }
    }
    // Overlapping windows emit their candidates out of order; one stable sort
    // restores the chronological guarantee without deduplicating.
    slots.sort_by_key(|slot| slot.start);
    Ok(slots)
}

/// The available starts for one day, in chronological order.
///
/// Convenience over [`day_slots`] for callers that only render bookable
/// times.
pub fn available_starts(
    date: NaiveDate,
    service_id: Option<&str>,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> Result<Vec<DateTime<Utc>>> {
    Ok(day_slots(date, service_id, snapshot, config, now)?
        .into_iter()
        .filter(|slot| slot.available)
        .map(|slot| slot.start)
        .collect())
}

/// Decide whether one proposed start time can be booked.
///
/// Checks run in a fixed order and the first failure wins: the service must
/// exist and be active, the session must fit inside an active window on that
/// weekday, the start must respect the advance-notice floor, the buffered
/// session must not touch a buffered occupied appointment, and the raw
/// session must not touch an administrative block.
///
/// `exclude_appointment_id` removes one appointment from conflict checks so a
/// reschedule can land inside its own old span. When `client_id` is given and
/// the colliding appointment belongs to that client, the reason says so
/// instead of reporting a generic conflict.
///
/// This never errors: an unknown service is simply not bookable.
pub fn check_slot(
    start: DateTime<Utc>,
    service_id: &str,
    exclude_appointment_id: Option<&str>,
    client_id: Option<&str>,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> SlotCheck {
    let Some(service) = snapshot.active_service(service_id) else {
        return SlotCheck::rejected(SlotRejection::ServiceUnavailable);
    };
    let duration = service.duration();

    let in_window = snapshot
        .active_windows_on(start.date_naive().weekday())
        .iter()
        .any(|w| w.admits(start.time(), duration));
    if !in_window {
        return SlotCheck::rejected(SlotRejection::OutsideHours);
    }

    if start - now < Duration::hours(config.min_advance_hours) {
        return SlotCheck::rejected(SlotRejection::AdvanceNotice {
            hours: config.min_advance_hours,
        });
    }

    if let Some(other) = conflict::first_appointment_conflict(
        start,
        duration,
        snapshot,
        config,
        exclude_appointment_id,
    ) {
        let own = client_id.is_some_and(|id| id == other.client_id);
        return SlotCheck::rejected(if own {
            SlotRejection::OwnConflict
        } else {
            SlotRejection::Conflict
        });
    }

    if conflict::first_blocked_conflict(start, duration, snapshot).is_some() {
        return SlotCheck::rejected(SlotRejection::Blocked);
    }

    SlotCheck::ok()
}

/// Earliest available start on or after `from`, scanning up to
/// `horizon_days` days of grids.
///
/// Returns `Ok(None)` when the horizon holds no bookable slot.
pub fn next_available_start(
    from: NaiveDate,
    horizon_days: u32,
    service_id: Option<&str>,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    for offset in 0..i64::from(horizon_days) {
        let date = from + Duration::days(offset);
        let first = day_slots(date, service_id, snapshot, config, now)?
            .into_iter()
            .find(|slot| slot.available);
        if let Some(slot) = first {
            return Ok(Some(slot.start));
        }
    }
    Ok(None)
}

/// Label one grid candidate. Advance notice is checked first, then occupied
/// appointments, then blocks; the first failure names the reason.
fn evaluate(
    start: DateTime<Utc>,
    duration: Duration,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> TimeSlot {
    let reason = if start - now < Duration::hours(config.min_advance_hours) {
        Some(SlotRejection::InsufficientNotice)
    } else if conflict::first_appointment_conflict(start, duration, snapshot, config, None)
        .is_some()
    {
        Some(SlotRejection::Taken)
    } else if conflict::first_blocked_conflict(start, duration, snapshot).is_some() {
        Some(SlotRejection::Blocked)
    } else {
        None
    };

    TimeSlot {
        start,
        available: reason.is_none(),
        reason,
    }
}
