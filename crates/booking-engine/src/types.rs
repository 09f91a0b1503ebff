//! Core calendar domain types shared by both engines.
//!
//! Everything is UTC. Appointment times arrive as RFC 3339 strings at the
//! boundaries and are held as `DateTime<Utc>` here. Weekly windows are wall
//! times ("HH:MM") attached to a day of week, serialized as 0-6 with
//! 0 = Sunday.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// A bookable service offered by the practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Session length in minutes.
    pub duration_minutes: u32,
    /// Full price, used by the fee-policy engine.
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Service {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this state still occupies its slot.
    pub fn occupies_slot(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

/// A booked session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub service_id: String,
    pub client_id: String,
    pub start: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// A weekly recurring span in which sessions may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Day the window recurs on; serialized as 0-6 with 0 = Sunday.
    #[serde(with = "weekday_num")]
    pub day_of_week: Weekday,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl AvailabilityWindow {
    pub fn span(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a session starting at `start` lies entirely inside the window.
    ///
    /// Seconds are ignored; booking times are minute-granular.
    pub fn admits(&self, start: NaiveTime, duration: Duration) -> bool {
        let start_min = minute_of_day(start);
        start_min >= minute_of_day(self.start)
            && start_min + duration.num_minutes() <= minute_of_day(self.end)
    }
}

/// An administrative hold on a concrete time range (staff meeting, cleanup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
    /// Optional staff-facing note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl BlockedSlot {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Point-in-time view of everything the engines read.
///
/// The engines never mutate a snapshot: callers load one, ask questions, and
/// persist writes elsewhere. Under concurrent booking the answers computed
/// from a snapshot are advisory; the store's uniqueness constraint on
/// (service, start) has the final word.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSnapshot {
    pub services: Vec<Service>,
    pub windows: Vec<AvailabilityWindow>,
    pub appointments: Vec<Appointment>,
    pub blocked: Vec<BlockedSlot>,
}

impl CalendarSnapshot {
    /// Look up a service regardless of its active flag.
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Look up a service that exists and is active.
    pub fn active_service(&self, id: &str) -> Option<&Service> {
        self.service(id).filter(|s| s.active)
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Active windows recurring on `day`, sorted by start time.
    pub fn active_windows_on(&self, day: Weekday) -> Vec<&AvailabilityWindow> {
        let mut windows: Vec<&AvailabilityWindow> = self
            .windows
            .iter()
            .filter(|w| w.active && w.day_of_week == day)
            .collect();
        windows.sort_by_key(|w| w.start);
        windows
    }

    /// Appointments that still occupy their slot (pending or confirmed).
    pub fn occupying_appointments(&self) -> impl Iterator<Item = &Appointment> + '_ {
        self.appointments.iter().filter(|a| a.status.occupies_slot())
    }

    /// Reject snapshots containing inverted windows (start at or after end).
    pub fn validate(&self) -> Result<()> {
        for w in &self.windows {
            if w.start >= w.end {
                return Err(BookingError::InvalidWindow(format!(
                    "{} {}..{} (start must precede end)",
                    w.day_of_week,
                    w.start.format("%H:%M"),
                    w.end.format("%H:%M"),
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn minute_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour() * 60 + t.minute())
}

fn default_true() -> bool {
    true
}

/// Serialize wall times as "HH:MM" strings.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}

/// Serialize days of week as 0-6 with 0 = Sunday.
pub(crate) mod weekday_num {
    use chrono::Weekday;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(day.num_days_from_sunday() as u8)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Weekday, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u8::deserialize(deserializer)? {
            0 => Ok(Weekday::Sun),
            1 => Ok(Weekday::Mon),
            2 => Ok(Weekday::Tue),
            3 => Ok(Weekday::Wed),
            4 => Ok(Weekday::Thu),
            5 => Ok(Weekday::Fri),
            6 => Ok(Weekday::Sat),
            other => Err(D::Error::custom(format!(
                "day_of_week must be 0-6 (0 = Sunday), got {other}"
            ))),
        }
    }
}
