//! Property-based tests for the slot grid and fee tiers using proptest.
//!
//! These tests verify invariants that should hold for *any* calendar shape,
//! not just the fixtures in `availability_tests.rs` and `policy_tests.rs`.

use booking_engine::types::{
    Appointment, AppointmentStatus, AvailabilityWindow, BlockedSlot, CalendarSnapshot, Service,
};
use booking_engine::{
    available_starts, can_reschedule, cancellation_policy, check_slot, day_slots, hours_remaining,
    reschedule_policy, warning_color, FeePolicy, SchedulingConfig, SlotRejection, WarningColor,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Strategies — quarter-aligned times so grid positions are exactly computable
// ---------------------------------------------------------------------------

/// Window start as minute-of-day, 06:00 to 13:00 on quarter marks.
fn arb_window_start() -> impl Strategy<Value = u32> {
    (24u32..=52).prop_map(|q| q * 15)
}

/// Window length in minutes, 15 minutes to 7 hours on quarter marks.
fn arb_window_len() -> impl Strategy<Value = u32> {
    (1u32..=28).prop_map(|q| q * 15)
}

/// Service duration in minutes, 15 to 120 on quarter marks.
fn arb_duration() -> impl Strategy<Value = u32> {
    (1u32..=8).prop_map(|q| q * 15)
}

/// Appointment start as minute-of-day, 10:00 to 17:00 on quarter marks.
fn arb_appointment_minute() -> impl Strategy<Value = u32> {
    (40u32..=68).prop_map(|q| q * 15)
}

fn arb_status() -> impl Strategy<Value = AppointmentStatus> {
    prop_oneof![
        Just(AppointmentStatus::Pending),
        Just(AppointmentStatus::Confirmed),
        Just(AppointmentStatus::Cancelled),
        Just(AppointmentStatus::Completed),
        Just(AppointmentStatus::NoShow),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The fixed day under test: Monday 2026-09-14.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()
}

/// A clock a week before the day under test, so advance notice always passes
/// unless a property moves the clock on purpose.
fn week_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 7, 12, 0, 0).unwrap()
}

fn minute_time(minute_of_day: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minute_of_day / 60, minute_of_day % 60, 0).unwrap()
}

fn at_minute(minute_of_day: u32) -> DateTime<Utc> {
    monday().and_time(minute_time(minute_of_day)).and_utc()
}

fn service(duration_minutes: u32) -> Service {
    Service {
        id: "counseling".to_string(),
        name: "Counseling".to_string(),
        duration_minutes,
        price: dec!(120.00),
        active: true,
    }
}

fn monday_window(start_min: u32, end_min: u32) -> AvailabilityWindow {
    AvailabilityWindow {
        day_of_week: Weekday::Mon,
        start: minute_time(start_min),
        end: minute_time(end_min),
        active: true,
    }
}

fn appointment(id: &str, minute_of_day: u32, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: id.to_string(),
        service_id: "counseling".to_string(),
        client_id: format!("client-{id}"),
        start: at_minute(minute_of_day),
        status,
    }
}

fn rules() -> SchedulingConfig {
    SchedulingConfig::default()
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: On an empty calendar the grid is a full arithmetic walk —
//   one candidate per granularity step from window start, all available
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn empty_calendar_grid_walks_the_whole_window(
        start_min in arb_window_start(),
        span_min in arb_window_len(),
        dur_min in arb_duration(),
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(dur_min)],
            windows: vec![monday_window(start_min, start_min + span_min)],
            ..CalendarSnapshot::default()
        };

        let slots = day_slots(monday(), Some("counseling"), &snapshot, &rules(), week_before())
            .unwrap();

        if span_min < dur_min {
            prop_assert!(
                slots.is_empty(),
                "a {span_min}-minute window cannot hold a {dur_min}-minute session"
            );
        } else {
            prop_assert_eq!(
                slots.len(),
                (span_min / 15) as usize,
                "expected one candidate per quarter of the window"
            );
            for (k, slot) in slots.iter().enumerate() {
                prop_assert_eq!(slot.start, at_minute(start_min + k as u32 * 15));
                prop_assert!(slot.available, "no calendar entries, so {:?} must be free", slot.start);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: A booked appointment blacks out a symmetric neighborhood —
//   exactly the candidates within duration + buffer on either side
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn booked_appointment_blackout_is_symmetric(
        appt_min in arb_appointment_minute(),
        dur_min in arb_duration(),
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(dur_min)],
            windows: vec![monday_window(480, 1200)], // 08:00-20:00
            appointments: vec![appointment("apt-1", appt_min, AppointmentStatus::Confirmed)],
            ..CalendarSnapshot::default()
        };

        let slots = day_slots(monday(), Some("counseling"), &snapshot, &rules(), week_before())
            .unwrap();

        // Both the candidate and the appointment carry the 15-minute buffer,
        // so the blackout is the closed quarter-mark range
        // [T - D - 15, T + D + 15] around the appointment start T.
        let lo = i64::from(appt_min) - i64::from(dur_min) - 15;
        let hi = i64::from(appt_min) + i64::from(dur_min) + 15;

        for slot in &slots {
            let m = i64::from(slot.start.time().hour() * 60 + slot.start.time().minute());
            let inside = lo <= m && m <= hi;
            prop_assert_eq!(
                slot.available,
                !inside,
                "candidate at minute {} vs blackout [{}, {}]",
                m, lo, hi
            );
            if inside {
                prop_assert_eq!(slot.reason.clone(), Some(SlotRejection::Taken));
            }
        }

        let blacked_out = slots.iter().filter(|s| !s.available).count();
        let expected = ((hi.min(1185) - lo.max(480)) / 15 + 1) as usize;
        prop_assert_eq!(blacked_out, expected);
    }
}

// ---------------------------------------------------------------------------
// Property 3: Advance notice splits the grid at exactly now + 24h —
//   candidates at or beyond the floor are available, the rest are labelled
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn advance_notice_splits_the_grid_at_the_floor(
        now_offset_min in 0i64..=2880,
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(60)],
            windows: vec![monday_window(540, 1020)], // 09:00-17:00
            ..CalendarSnapshot::default()
        };
        // Sweep the clock across the two days before the grid day.
        let now = Utc.with_ymd_and_hms(2026, 9, 12, 12, 0, 0).unwrap()
            + Duration::minutes(now_offset_min);

        let slots = day_slots(monday(), Some("counseling"), &snapshot, &rules(), now).unwrap();

        for slot in &slots {
            if slot.start - now >= Duration::hours(24) {
                prop_assert!(slot.available, "{:?} is beyond the notice floor", slot.start);
            } else {
                prop_assert_eq!(slot.reason.clone(), Some(SlotRejection::InsufficientNotice));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: The grid is sorted, quarter-aligned, and on the requested day,
//   and available_starts is exactly its available subset
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn grid_shape_holds_for_any_calendar(
        windows in prop::collection::vec((arb_window_start(), arb_window_len()), 1..=3),
        appts in prop::collection::vec((arb_appointment_minute(), arb_status()), 0..=3),
        dur_min in arb_duration(),
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(dur_min)],
            windows: windows
                .iter()
                .map(|&(start, len)| monday_window(start, start + len))
                .collect(),
            appointments: appts
                .iter()
                .enumerate()
                .map(|(i, &(minute, status))| appointment(&format!("apt-{i}"), minute, status))
                .collect(),
            ..CalendarSnapshot::default()
        };

        let slots = day_slots(monday(), Some("counseling"), &snapshot, &rules(), week_before())
            .unwrap();

        for pair in slots.windows(2) {
            prop_assert!(
                pair[0].start <= pair[1].start,
                "grid not sorted: {:?} > {:?}",
                pair[0].start,
                pair[1].start
            );
        }
        for slot in &slots {
            prop_assert_eq!(slot.start.date_naive(), monday());
            prop_assert_eq!(slot.start.time().minute() % 15, 0);
            prop_assert_eq!(slot.start.time().second(), 0);
        }

        let starts = available_starts(monday(), Some("counseling"), &snapshot, &rules(), week_before())
            .unwrap();
        let expected: Vec<DateTime<Utc>> =
            slots.iter().filter(|s| s.available).map(|s| s.start).collect();
        prop_assert_eq!(starts, expected);
    }
}

// ---------------------------------------------------------------------------
// Property 5: The point check agrees with the grid on every candidate that
//   fits its window; candidates that overrun the window are rejected as
//   outside hours by the point check even when the grid lists them
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn point_check_agrees_with_the_grid(
        appts in prop::collection::vec((arb_appointment_minute(), arb_status()), 0..=3),
        block in prop::option::of((arb_appointment_minute(), arb_duration())),
        dur_min in arb_duration(),
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(dur_min)],
            windows: vec![monday_window(540, 1020)], // 09:00-17:00
            appointments: appts
                .iter()
                .enumerate()
                .map(|(i, &(minute, status))| appointment(&format!("apt-{i}"), minute, status))
                .collect(),
            blocked: block
                .map(|(minute, len)| BlockedSlot {
                    start: at_minute(minute),
                    duration_minutes: len,
                    note: None,
                })
                .into_iter()
                .collect(),
        };

        let slots = day_slots(monday(), Some("counseling"), &snapshot, &rules(), week_before())
            .unwrap();

        for slot in &slots {
            let check = check_slot(
                slot.start,
                "counseling",
                None,
                None,
                &snapshot,
                &rules(),
                week_before(),
            );
            let minute = slot.start.time().hour() * 60 + slot.start.time().minute();
            let fits = minute + dur_min <= 1020;

            if fits {
                prop_assert_eq!(
                    check.available,
                    slot.available,
                    "grid and point check disagree at {:?}: grid {:?}, check {:?}",
                    slot.start,
                    slot.reason.clone(),
                    check.reason.clone()
                );
                if slot.reason == Some(SlotRejection::Taken) {
                    prop_assert_eq!(check.reason.clone(), Some(SlotRejection::Conflict));
                }
                if slot.reason == Some(SlotRejection::Blocked) {
                    prop_assert_eq!(check.reason.clone(), Some(SlotRejection::Blocked));
                }
            } else {
                prop_assert_eq!(check.reason.clone(), Some(SlotRejection::OutsideHours));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: Warning colors and the reschedule gate track the fee tiers
//   for any offset, including the boundary minutes
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn colors_and_gate_track_the_fee_tiers(offset_min in -5760i64..=5760) {
        let now = week_before();
        let start = now + Duration::minutes(offset_min);

        let tier = FeePolicy::from_remaining(start - now);
        let color = warning_color(hours_remaining(start, now));

        let expected = match tier {
            FeePolicy::Past => WarningColor::Gray,
            FeePolicy::Full => WarningColor::Red,
            FeePolicy::Half => WarningColor::Yellow,
            FeePolicy::Free => WarningColor::Green,
        };
        prop_assert_eq!(color, expected, "offset {} minutes, tier {:?}", offset_min, tier);

        prop_assert_eq!(
            can_reschedule(AppointmentStatus::Confirmed, start, now),
            matches!(tier, FeePolicy::Half | FeePolicy::Free)
        );
        prop_assert!(!can_reschedule(AppointmentStatus::Cancelled, start, now));
    }
}

// ---------------------------------------------------------------------------
// Property 7: Cancellation and reschedule decisions agree on the tier, and
//   their amounts are coherent cents-scale fractions of the price
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn decisions_agree_and_amounts_stay_at_cents_scale(
        cents in 0i64..=100_000,
        offset_min in -5760i64..=5760,
    ) {
        let now = week_before();
        let start = now + Duration::minutes(offset_min);
        let price = Decimal::new(cents, 2);

        let cancel = cancellation_policy(start, now, price);
        let resched = reschedule_policy(start, now, price);

        prop_assert_eq!(cancel.policy, resched.policy);
        prop_assert_eq!(&cancel.time_remaining, &resched.time_remaining);
        prop_assert_eq!(cancel.amount.scale(), 2, "refund {} not at cents scale", cancel.amount);
        prop_assert_eq!(resched.amount.scale(), 2, "fee {} not at cents scale", resched.amount);

        match cancel.policy {
            FeePolicy::Past => {
                prop_assert!(!cancel.allowed);
                prop_assert!(!resched.allowed);
                prop_assert_eq!(cancel.amount, Decimal::ZERO);
                prop_assert_eq!(resched.amount, Decimal::ZERO);
            }
            FeePolicy::Full => {
                prop_assert!(cancel.allowed, "cancelling late is allowed, just unrefunded");
                prop_assert!(!resched.allowed);
                prop_assert_eq!(cancel.percentage, 0);
                prop_assert_eq!(cancel.amount, Decimal::ZERO);
            }
            FeePolicy::Half => {
                prop_assert!(cancel.allowed);
                prop_assert!(resched.allowed);
                // Refund and fee are the same 50%, rounded half-up to cents.
                prop_assert_eq!(cancel.amount, resched.amount);
                let doubled = cancel.amount + cancel.amount;
                prop_assert!(
                    (doubled - price).abs() <= Decimal::new(1, 2),
                    "half of {} rounded to {}",
                    price,
                    cancel.amount
                );
            }
            FeePolicy::Free => {
                prop_assert!(cancel.allowed);
                prop_assert!(resched.allowed);
                prop_assert_eq!(cancel.percentage, 100);
                prop_assert_eq!(cancel.amount, price);
                prop_assert_eq!(resched.amount, Decimal::ZERO);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 8: The point check never panics — arbitrary second-granular
//   starts, durations, and unknown service ids all produce a verdict
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn point_check_never_panics(
        offset_secs in 0i64..=604_800,
        dur_min in 1u32..=240,
        which in 0usize..3,
    ) {
        let snapshot = CalendarSnapshot {
            services: vec![service(dur_min)],
            windows: vec![monday_window(540, 1020)],
            appointments: vec![appointment("apt-1", 600, AppointmentStatus::Confirmed)],
            ..CalendarSnapshot::default()
        };
        let ids = ["counseling", "ghost", ""];
        let start = monday().and_time(NaiveTime::MIN).and_utc() + Duration::seconds(offset_secs);

        // This must not panic; any verdict is acceptable.
        let _ = check_slot(start, ids[which], None, None, &snapshot, &rules(), week_before());
    }
}
