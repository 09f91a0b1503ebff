//! Buffered conflict checks between candidate slots and calendar entries.
//!
//! Every appointment, including the one a candidate would create, carries the
//! configured buffer on both sides: a candidate projects
//! [start - buffer, start + duration + buffer) and is compared against the
//! equally padded intervals of occupied appointments. Administrative blocks
//! are compared raw. Adjacent intervals (one ends exactly when the next
//! starts) are NOT conflicts.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulingConfig;
use crate::types::{Appointment, BlockedSlot, CalendarSnapshot, Service};

/// Two half-open intervals overlap iff `a.start < b.end && b.start < a.end`.
/// This excludes the adjacent case where `a.end == b.start`.
pub(crate) fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Duration an appointment occupies on the calendar.
///
/// Falls back to the configured default when the appointment references a
/// service no longer in the catalog: stale rows still hold their time.
pub(crate) fn appointment_duration(
    appointment: &Appointment,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
) -> Duration {
    snapshot
        .service(&appointment.service_id)
        .map(Service::duration)
        .unwrap_or_else(|| Duration::minutes(i64::from(config.default_duration_minutes)))
}

/// First occupying appointment whose buffered interval overlaps the buffered
/// candidate, skipping `exclude_appointment_id` when set (a reschedule may
/// land inside its own old span).
pub(crate) fn first_appointment_conflict<'a>(
    candidate_start: DateTime<Utc>,
    service_duration: Duration,
    snapshot: &'a CalendarSnapshot,
    config: &SchedulingConfig,
    exclude_appointment_id: Option<&str>,
) -> Option<&'a Appointment> {
    let buffer = Duration::minutes(config.buffer_minutes);
    let padded_start = candidate_start - buffer;
    let padded_end = candidate_start + service_duration + buffer;

    snapshot.occupying_appointments().find(|appt| {
        if exclude_appointment_id.is_some_and(|id| id == appt.id) {
            return false;
        }
        let appt_start = appt.start - buffer;
        let appt_end = appt.start + appointment_duration(appt, snapshot, config) + buffer;
        overlaps(padded_start, padded_end, appt_start, appt_end)
    })
}

/// First administrative block overlapping the raw candidate interval.
pub(crate) fn first_blocked_conflict<'a>(
    candidate_start: DateTime<Utc>,
    service_duration: Duration,
    snapshot: &'a CalendarSnapshot,
) -> Option<&'a BlockedSlot> {
    let candidate_end = candidate_start + service_duration;
    snapshot
        .blocked
        .iter()
        .find(|block| overlaps(candidate_start, candidate_end, block.start, block.end()))
}
