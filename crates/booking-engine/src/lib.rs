//! # booking-engine
//!
//! Deterministic availability and fee-policy engine for a counseling
//! practice's booking flow.
//!
//! Two engines share one clock and one configuration. The availability engine
//! turns weekly recurring windows plus existing appointments and
//! administrative blocks into concrete bookable slots, spaced at the
//! configured granularity and padded with a buffer against their neighbors.
//! The policy engine prices cancellations and reschedules purely from the
//! time remaining before the appointment: free beyond 48 hours, half the
//! service price between 24 and 48, blocked inside 24.
//!
//! All computation is UTC and side-effect free. Callers pass an explicit
//! `now` and a [`types::CalendarSnapshot`]; the engines answer without
//! touching storage. Under concurrent booking the answers are advisory and
//! the store's uniqueness constraint has the final word.
//!
//! ## Modules
//!
//! - [`availability`] — candidate slot grids and bookability checks
//! - [`policy`] — cancellation/reschedule fee tiers and warning colors
//! - [`reschedule`] — gatekeeping for moving an existing appointment
//! - [`config`] — the shared scheduling constants
//! - [`types`] — calendar domain types
//! - [`error`] — error types

pub mod availability;
pub mod config;
mod conflict;
pub mod error;
pub mod policy;
pub mod reschedule;
pub mod types;

pub use availability::{
    available_starts, check_slot, day_slots, next_available_start, SlotCheck, SlotRejection,
    TimeSlot,
};
pub use config::{BusinessHours, DaySpan, HoursViolation, SchedulingConfig};
pub use error::BookingError;
pub use policy::{
    can_reschedule, cancellation_policy, hours_remaining, reschedule_policy,
    time_remaining_label, warning_color, FeePolicy, PolicyDecision, WarningColor,
};
pub use reschedule::{check_reschedule, RescheduleCheck};
pub use types::{
    Appointment, AppointmentStatus, AvailabilityWindow, BlockedSlot, CalendarSnapshot, Service,
};
