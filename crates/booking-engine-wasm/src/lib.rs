//! WASM bindings for booking-engine.
//!
//! Exposes the day slot grid, the single-slot booking check, the fee-policy
//! calculators, and the reschedule gate to the JavaScript web layer via
//! `wasm-bindgen`. All complex values cross the boundary as JSON strings; the
//! engine's own types define the wire shapes, so no separate DTO layer is
//! needed here.
//!
//! Every export takes `now` as an ISO 8601 string. The caller injects the
//! clock instead of this module reading it ambiently, which keeps route
//! handlers and their tests reproducible.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p booking-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/booking-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/booking_engine_wasm.wasm
//! # Rename .js -> .cjs for ESM compatibility
//! mv packages/booking-engine-js/wasm/booking_engine_wasm.js \
//!    packages/booking-engine-js/wasm/booking_engine_wasm.cjs
//! ```

use std::str::FromStr;

use booking_engine::types::CalendarSnapshot;
use booking_engine::SchedulingConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Helpers: parse JavaScript-side strings into engine inputs
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts both RFC 3339 (with timezone offset, e.g., "2026-09-14T10:00:00+00:00")
/// and naive local time (e.g., "2026-09-14T10:00:00"), which is interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    // Try RFC 3339 first (has timezone info).
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Fall back to naive datetime interpreted as UTC.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))
}

/// Parse a "YYYY-MM-DD" string into a calendar date (interpreted as a UTC day).
fn parse_date(s: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| JsValue::from_str(&format!("Invalid date '{}': {}", s, e)))
}

/// Parse a decimal price string (e.g., "120.00") into a `Decimal`.
fn parse_price(s: &str) -> Result<Decimal, JsValue> {
    Decimal::from_str(s).map_err(|e| JsValue::from_str(&format!("Invalid price '{}': {}", s, e)))
}

/// Parse a calendar snapshot JSON document and reject inverted windows.
fn parse_snapshot(json: &str) -> Result<CalendarSnapshot, JsValue> {
    let snapshot: CalendarSnapshot = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid snapshot JSON: {}", e)))?;
    snapshot
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(snapshot)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Generate the full candidate slot grid for one day.
///
/// Returns a JSON string containing an array of `{start, available, reason?}`
/// objects, chronological, one entry per 15-minute candidate. `reason` is the
/// client-facing message and is omitted when the slot is available.
///
/// # Arguments
/// - `snapshot_json` -- Calendar snapshot: `{services, windows, appointments, blocked}`
/// - `date` -- UTC calendar day, "YYYY-MM-DD"
/// - `service_id` -- Service to size sessions for; omit for the default duration
/// - `now` -- Current time as an ISO 8601 string (injected clock)
#[wasm_bindgen(js_name = "daySlots")]
pub fn day_slots(
    snapshot_json: &str,
    date: &str,
    service_id: Option<String>,
    now: &str,
) -> Result<String, JsValue> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let date = parse_date(date)?;
    let now = parse_datetime(now)?;
    let config = SchedulingConfig::default();

    let slots = booking_engine::day_slots(date, service_id.as_deref(), &snapshot, &config, now)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    to_json(&slots)
}

/// List only the bookable start times for one day.
///
/// Returns a JSON string containing an array of RFC 3339 datetime strings,
/// the available subset of [`daySlots`](day_slots).
#[wasm_bindgen(js_name = "availableStarts")]
pub fn available_starts(
    snapshot_json: &str,
    date: &str,
    service_id: Option<String>,
    now: &str,
) -> Result<String, JsValue> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let date = parse_date(date)?;
    let now = parse_datetime(now)?;
    let config = SchedulingConfig::default();

    let starts =
        booking_engine::available_starts(date, service_id.as_deref(), &snapshot, &config, now)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

    to_json(&starts)
}

/// Check whether one concrete start time can be booked.
///
/// Returns a JSON string of `{available, reason?}`. Business-rule rejections
/// (unknown service, outside hours, notice, conflicts, blocks) are data in the
/// result, never thrown errors.
///
/// This check is advisory: it holds no lock, so the route handler must run it
/// as close as possible to the appointment write and treat the store's
/// uniqueness-constraint violation as the authoritative rejection.
///
/// # Arguments
/// - `snapshot_json` -- Calendar snapshot
/// - `start` -- Proposed start time, ISO 8601
/// - `service_id` -- Service to book
/// - `exclude_appointment_id` -- Appointment to omit from conflicts (reschedule case)
/// - `client_id` -- Requesting client; changes the phrasing when the conflict is their own
/// - `now` -- Current time as an ISO 8601 string (injected clock)
#[wasm_bindgen(js_name = "checkSlot")]
pub fn check_slot(
    snapshot_json: &str,
    start: &str,
    service_id: &str,
    exclude_appointment_id: Option<String>,
    client_id: Option<String>,
    now: &str,
) -> Result<String, JsValue> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let start = parse_datetime(start)?;
    let now = parse_datetime(now)?;
    let config = SchedulingConfig::default();

    let verdict = booking_engine::check_slot(
        start,
        service_id,
        exclude_appointment_id.as_deref(),
        client_id.as_deref(),
        &snapshot,
        &config,
        now,
    );

    to_json(&verdict)
}

/// Find the earliest bookable start on or after `from`, scanning up to
/// `horizon_days` days.
///
/// Returns a JSON string: an RFC 3339 datetime, or `null` when the horizon
/// holds no bookable slot.
#[wasm_bindgen(js_name = "nextAvailableStart")]
pub fn next_available_start(
    snapshot_json: &str,
    from: &str,
    horizon_days: u32,
    service_id: Option<String>,
    now: &str,
) -> Result<String, JsValue> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let from = parse_date(from)?;
    let now = parse_datetime(now)?;
    let config = SchedulingConfig::default();

    let next = booking_engine::next_available_start(
        from,
        horizon_days,
        service_id.as_deref(),
        &snapshot,
        &config,
        now,
    )
    .map_err(|e| JsValue::from_str(&e.to_string()))?;

    to_json(&next)
}

/// Price a reschedule request for an appointment at `start`.
///
/// Returns a JSON string of `{allowed, policy, amount, percentage, message,
/// time_remaining}` with `amount` as a decimal string rounded to cents.
#[wasm_bindgen(js_name = "reschedulePolicy")]
pub fn reschedule_policy(start: &str, now: &str, price: &str) -> Result<String, JsValue> {
    let start = parse_datetime(start)?;
    let now = parse_datetime(now)?;
    let price = parse_price(price)?;

    to_json(&booking_engine::reschedule_policy(start, now, price))
}

/// Price a cancellation request for an appointment at `start`.
///
/// Same shape as [`reschedulePolicy`](reschedule_policy); `amount` is the
/// refund granted rather than the fee charged.
#[wasm_bindgen(js_name = "cancellationPolicy")]
pub fn cancellation_policy(start: &str, now: &str, price: &str) -> Result<String, JsValue> {
    let start = parse_datetime(start)?;
    let now = parse_datetime(now)?;
    let price = parse_price(price)?;

    to_json(&booking_engine::cancellation_policy(start, now, price))
}

/// Decide whether an existing appointment may move to a new start time.
///
/// Looks up `appointment_id` in the snapshot and runs the full reschedule
/// gate: status, fee tier, practice opening hours, then the slot check with
/// the appointment itself excluded. Returns a JSON string of `{allowed,
/// reason?, policy?}`.
///
/// An unknown appointment id is a thrown error, not a verdict -- there is
/// nothing to gate without the appointment row.
#[wasm_bindgen(js_name = "checkReschedule")]
pub fn check_reschedule(
    snapshot_json: &str,
    appointment_id: &str,
    new_start: &str,
    now: &str,
) -> Result<String, JsValue> {
    let snapshot = parse_snapshot(snapshot_json)?;
    let new_start = parse_datetime(new_start)?;
    let now = parse_datetime(now)?;
    let config = SchedulingConfig::default();

    let Some(appointment) = snapshot.appointment(appointment_id) else {
        return Err(JsValue::from_str(&format!(
            "Appointment not found: {}",
            appointment_id
        )));
    };

    let check =
        booking_engine::check_reschedule(appointment, new_start, &snapshot, &config, now);

    to_json(&check)
}
