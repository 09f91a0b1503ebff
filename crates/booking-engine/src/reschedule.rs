//! Gatekeeping for moving an existing appointment to a new time.
//!
//! A reschedule request passes four gates in order: the appointment status
//! must still be open, the fee tier must permit rescheduling, the new time
//! must fall inside practice opening hours, and the new slot must be bookable
//! for the appointment's service. The appointment itself is excluded from the
//! final conflict check so a move within its own occupied span is allowed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::availability::check_slot;
use crate::config::SchedulingConfig;
use crate::policy::{reschedule_policy, PolicyDecision};
use crate::types::{Appointment, AppointmentStatus, CalendarSnapshot};

/// Outcome of a reschedule request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RescheduleCheck {
    pub allowed: bool,
    /// Client-facing explanation when blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Fee decision for the move, present once the service resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyDecision>,
}

impl RescheduleCheck {
    fn blocked(reason: String, policy: Option<PolicyDecision>) -> Self {
        RescheduleCheck {
            allowed: false,
            reason: Some(reason),
            policy,
        }
    }
}

/// Decide whether `appointment` may move to `new_start`.
///
/// Opening hours are checked before slot availability, so a Sunday target is
/// reported as "We are closed on Sundays" even when the calendar carries no
/// Sunday windows either.
pub fn check_reschedule(
    appointment: &Appointment,
    new_start: DateTime<Utc>,
    snapshot: &CalendarSnapshot,
    config: &SchedulingConfig,
    now: DateTime<Utc>,
) -> RescheduleCheck {
    if !matches!(
        appointment.status,
        AppointmentStatus::Pending | AppointmentStatus::Confirmed
    ) {
        return RescheduleCheck::blocked(
            "Only pending or confirmed appointments can be rescheduled".to_owned(),
            None,
        );
    }

    let Some(service) = snapshot.active_service(&appointment.service_id) else {
        return RescheduleCheck::blocked("Service not found or inactive".to_owned(), None);
    };

    let policy = reschedule_policy(appointment.start, now, service.price);
    if !policy.allowed {
        let reason = policy.message.clone();
        return RescheduleCheck::blocked(reason, Some(policy));
    }

    if let Some(violation) = config.business_hours.violation(new_start, service.duration()) {
        return RescheduleCheck::blocked(violation.to_string(), Some(policy));
    }

    let slot = check_slot(
        new_start,
        &appointment.service_id,
        Some(&appointment.id),
        Some(&appointment.client_id),
        snapshot,
        config,
        now,
    );
    if let Some(rejection) = slot.reason {
        return RescheduleCheck::blocked(rejection.to_string(), Some(policy));
    }

    RescheduleCheck {
        allowed: true,
        reason: None,
        policy: Some(policy),
    }
}
