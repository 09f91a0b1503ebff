//! Cancellation and reschedule fee tiers.
//!
//! Fees are banded purely on the time remaining before the appointment:
//! 48 hours or more is free, 24 to 48 hours costs half the service price,
//! under 24 hours blocks rescheduling and forfeits any refund, and past
//! appointments allow nothing.
//!
//! Banding always uses the exact remaining duration (or its floor in whole
//! hours). Only the human-readable label rounds up, so "1 hour remaining"
//! shows through the final hour without ever moving a decision across a tier
//! boundary.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::AppointmentStatus;

/// Below this many remaining hours, rescheduling is blocked and cancellation
/// forfeits the refund.
pub const FULL_FEE_CUTOFF_HOURS: i64 = 24;
/// At or above this many remaining hours, rescheduling and cancellation are
/// free.
pub const FREE_CUTOFF_HOURS: i64 = 48;

/// Fee tier derived from the time remaining before an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeePolicy {
    /// The appointment start is already in the past.
    Past,
    /// Under 24 hours remain: no reschedule, no refund.
    Full,
    /// Between 24 and 48 hours remain: half the service price applies.
    Half,
    /// 48 hours or more remain: no charge.
    Free,
}

impl FeePolicy {
    /// Band the exact remaining time into a tier.
    pub fn from_remaining(remaining: Duration) -> Self {
        if remaining < Duration::zero() {
            FeePolicy::Past
        } else if remaining < Duration::hours(FULL_FEE_CUTOFF_HOURS) {
            FeePolicy::Full
        } else if remaining < Duration::hours(FREE_CUTOFF_HOURS) {
            FeePolicy::Half
        } else {
            FeePolicy::Free
        }
    }
}

impl fmt::Display for FeePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FeePolicy::Past => "past",
            FeePolicy::Full => "full",
            FeePolicy::Half => "half",
            FeePolicy::Free => "free",
        })
    }
}

/// Traffic-light urgency for an upcoming appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningColor {
    Gray,
    Red,
    Yellow,
    Green,
}

impl fmt::Display for WarningColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarningColor::Gray => "gray",
            WarningColor::Red => "red",
            WarningColor::Yellow => "yellow",
            WarningColor::Green => "green",
        })
    }
}

/// A priced verdict on cancelling or rescheduling one appointment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyDecision {
    /// Whether the action may proceed.
    pub allowed: bool,
    /// The fee tier that applied.
    pub policy: FeePolicy,
    /// Money the tier puts in play: the fee charged for a reschedule, or the
    /// refund issued for a cancellation. Rounded half-up to cents.
    pub amount: Decimal,
    /// Percentage of the service price `amount` represents.
    pub percentage: u8,
    /// Client-facing explanation of the verdict.
    pub message: String,
    /// Human label for the remaining time, e.g. "1 day and 12 hours remaining".
    pub time_remaining: String,
}

/// Price a reschedule request.
///
/// Free at 48 hours or more out, half the service price between 24 and 48,
/// blocked inside 24 hours, blocked once past.
pub fn reschedule_policy(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    price: Decimal,
) -> PolicyDecision {
    let tier = FeePolicy::from_remaining(start - now);
    let (allowed, percentage, message) = match tier {
        FeePolicy::Past => (false, 0, "Past appointments cannot be rescheduled"),
        FeePolicy::Full => (
            false,
            0,
            "Appointments cannot be rescheduled within 24 hours of the scheduled time",
        ),
        FeePolicy::Half => (
            true,
            50,
            "A rescheduling fee of 50% of the service price applies",
        ),
        FeePolicy::Free => (true, 0, "This appointment can be rescheduled free of charge"),
    };
    PolicyDecision {
        allowed,
        policy: tier,
        amount: percentage_of(price, percentage),
        percentage,
        message: message.to_owned(),
        time_remaining: time_remaining_label(start, now),
    }
}

/// Price a cancellation request. `amount` is the refund.
///
/// Full refund at 48 hours or more out, half between 24 and 48, nothing
/// inside 24 hours. Past appointments cannot be cancelled at all.
pub fn cancellation_policy(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    price: Decimal,
) -> PolicyDecision {
    let tier = FeePolicy::from_remaining(start - now);
    let (allowed, percentage, message) = match tier {
        FeePolicy::Past => (false, 0, "This appointment has already passed"),
        FeePolicy::Full => (
            true,
            0,
            "No refund is available within 24 hours of the appointment",
        ),
        FeePolicy::Half => (
            true,
            50,
            "A 50% refund applies when cancelling between 24 and 48 hours before the appointment",
        ),
        FeePolicy::Free => (
            true,
            100,
            "This appointment can be cancelled with a full refund",
        ),
    };
    PolicyDecision {
        allowed,
        policy: tier,
        amount: percentage_of(price, percentage),
        percentage,
        message: message.to_owned(),
        time_remaining: time_remaining_label(start, now),
    }
}

/// Quick boolean gate used by list views: rescheduling is possible only for
/// pending or confirmed appointments sitting in the half or free tier.
pub fn can_reschedule(
    status: AppointmentStatus,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    if !matches!(
        status,
        AppointmentStatus::Pending | AppointmentStatus::Confirmed
    ) {
        return false;
    }
    matches!(
        FeePolicy::from_remaining(start - now),
        FeePolicy::Half | FeePolicy::Free
    )
}

/// Whole hours remaining until `start`, rounded toward negative infinity.
///
/// Feeding this into [`warning_color`] keeps the colors aligned with the fee
/// tiers: 23 hours 59 minutes out is 23 whole hours, which is red, which is
/// the full-fee tier.
pub fn hours_remaining(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_seconds().div_euclid(3600)
}

/// Color for a remaining-hours count: gray once past, red under 24, yellow
/// under 48, green from 48 up. Matches [`FeePolicy::from_remaining`] banding.
pub fn warning_color(hours_remaining: i64) -> WarningColor {
    if hours_remaining < 0 {
        WarningColor::Gray
    } else if hours_remaining < FULL_FEE_CUTOFF_HOURS {
        WarningColor::Red
    } else if hours_remaining < FREE_CUTOFF_HOURS {
        WarningColor::Yellow
    } else {
        WarningColor::Green
    }
}

/// Human label for the time remaining, rounded UP to the next whole hour so
/// an appointment 30 minutes out still reads "1 hour remaining".
pub fn time_remaining_label(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (start - now).num_seconds();
    if secs <= 0 {
        return "Past due".to_owned();
    }
    let hours = (secs + 3599).div_euclid(3600);
    if hours < 24 {
        return format!("{hours} {} remaining", plural(hours, "hour"));
    }
    let days = hours / 24;
    let rem = hours % 24;
    if rem == 0 {
        format!("{days} {} remaining", plural(days, "day"))
    } else {
        format!(
            "{days} {} and {rem} {} remaining",
            plural(days, "day"),
            plural(rem, "hour"),
        )
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        unit.to_owned()
    } else {
        format!("{unit}s")
    }
}

fn percentage_of(price: Decimal, percentage: u8) -> Decimal {
    // Multiplying by the percentage at scale 2 (50 -> 0.50) keeps the result
    // at scale >= 2, so a whole-number price still renders as "60.00".
    (price * Decimal::new(i64::from(percentage), 2))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
