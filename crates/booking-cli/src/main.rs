//! `wellmind` CLI — inspect availability and fee-policy decisions from a
//! calendar snapshot.
//!
//! Admin/support tooling over the same engines the web layer calls: feed it a
//! snapshot JSON document (the services, weekly windows, appointments, and
//! blocked slots the persistence layer would hand the engines) and ask it the
//! questions a route handler would ask.
//!
//! ## Usage
//!
//! ```sh
//! # Bookable start times for a day (snapshot from stdin)
//! cat clinic.json | wellmind slots --date 2026-09-14 --service counseling-60
//!
//! # Full candidate grid, including unavailable slots and their reasons
//! wellmind slots -i clinic.json --date 2026-09-14 --all
//!
//! # Scriptable pre-check for one concrete start (exit code 1 when unavailable)
//! wellmind check -i clinic.json --at 2026-09-14T10:00:00Z --service counseling-60
//!
//! # Fee tier for cancelling or rescheduling an appointment
//! wellmind policy cancel --at 2026-09-16T10:00:00Z --price 120.00
//!
//! # First bookable start within a horizon
//! wellmind next -i clinic.json --from 2026-09-14 --horizon 30
//!
//! # Pin the clock for reproducible output
//! wellmind --now 2026-09-07T12:00:00Z slots -i clinic.json --date 2026-09-14
//! ```

use anyhow::{Context, Result};
use booking_engine::types::CalendarSnapshot;
use booking_engine::{
    available_starts, cancellation_policy, check_slot, day_slots, next_available_start,
    reschedule_policy, PolicyDecision, SchedulingConfig,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(
    name = "wellmind",
    version,
    about = "Counseling-practice booking engine CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the clock with an RFC 3339 time for reproducible output
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate slots for one or more days
    Slots {
        /// Snapshot JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// First day to enumerate (YYYY-MM-DD, UTC)
        #[arg(long)]
        date: NaiveDate,
        /// Service to size sessions for (default duration if omitted)
        #[arg(long)]
        service: Option<String>,
        /// Number of consecutive days to enumerate
        #[arg(long, default_value_t = 1)]
        days: u32,
        /// Include unavailable candidates with their reasons
        #[arg(long)]
        all: bool,
    },
    /// Check whether one concrete start time can be booked
    Check {
        /// Snapshot JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Proposed start time (RFC 3339)
        #[arg(long)]
        at: DateTime<Utc>,
        /// Service to book
        #[arg(long)]
        service: String,
        /// Appointment id to exclude from conflicts (reschedule case)
        #[arg(long)]
        exclude: Option<String>,
        /// Requesting client id (changes the self-conflict phrasing)
        #[arg(long)]
        client: Option<String>,
    },
    /// Compute the fee tier for cancelling or rescheduling an appointment
    Policy {
        /// Action to price
        #[arg(value_enum)]
        action: PolicyAction,
        /// Scheduled appointment time (RFC 3339)
        #[arg(long)]
        at: DateTime<Utc>,
        /// Full service price, e.g. 120.00
        #[arg(long)]
        price: Decimal,
    },
    /// Find the first bookable start on or after a date
    Next {
        /// Snapshot JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// First day to scan (YYYY-MM-DD, UTC)
        #[arg(long)]
        from: NaiveDate,
        /// Service to size sessions for (default duration if omitted)
        #[arg(long)]
        service: Option<String>,
        /// Maximum number of days to scan
        #[arg(long, default_value_t = 30)]
        horizon: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyAction {
    /// Refund tier for cancelling
    Cancel,
    /// Fee tier for rescheduling
    Reschedule,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Tests pin --now; interactive use takes the system clock.
    let now = cli.now.unwrap_or_else(Utc::now);
    let config = SchedulingConfig::default();

    match cli.command {
        Commands::Slots {
            input,
            date,
            service,
            days,
            all,
        } => {
            let snapshot = load_snapshot(input.as_deref())?;
            for offset in 0..i64::from(days) {
                let day = date + Duration::days(offset);
                if all {
                    let grid = day_slots(day, service.as_deref(), &snapshot, &config, now)
                        .context("Failed to generate day slots")?;
                    for slot in grid {
                        match slot.reason {
                            Some(reason) => println!("{}  {}", slot.start.to_rfc3339(), reason),
                            None => println!("{}  available", slot.start.to_rfc3339()),
                        }
                    }
                } else {
                    let starts =
                        available_starts(day, service.as_deref(), &snapshot, &config, now)
                            .context("Failed to generate day slots")?;
                    for start in starts {
                        println!("{}", start.to_rfc3339());
                    }
                }
            }
        }
        Commands::Check {
            input,
            at,
            service,
            exclude,
            client,
        } => {
            let snapshot = load_snapshot(input.as_deref())?;
            let verdict = check_slot(
                at,
                &service,
                exclude.as_deref(),
                client.as_deref(),
                &snapshot,
                &config,
                now,
            );
            match verdict.reason {
                None => println!("Available"),
                Some(reason) => {
                    println!("Unavailable: {}", reason);
                    process::exit(1);
                }
            }
        }
        Commands::Policy { action, at, price } => {
            let decision = match action {
                PolicyAction::Cancel => cancellation_policy(at, now, price),
                PolicyAction::Reschedule => reschedule_policy(at, now, price),
            };
            print_decision(action, &decision);
        }
        Commands::Next {
            input,
            from,
            service,
            horizon,
        } => {
            let snapshot = load_snapshot(input.as_deref())?;
            let next =
                next_available_start(from, horizon, service.as_deref(), &snapshot, &config, now)
                    .context("Failed to scan for available slots")?;
            match next {
                Some(start) => println!("{}", start.to_rfc3339()),
                None => {
                    println!("No available slots within {} days of {}", horizon, from);
                    process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Print a policy decision in aligned label/value lines.
///
/// The amount line is named for what the money means: the refund granted for
/// a cancellation, the fee charged for a reschedule.
fn print_decision(action: PolicyAction, decision: &PolicyDecision) {
    let amount_label = match action {
        PolicyAction::Cancel => "Refund:    ",
        PolicyAction::Reschedule => "Fee:       ",
    };
    println!("Allowed:    {}", if decision.allowed { "yes" } else { "no" });
    println!("Policy:     {}", decision.policy);
    println!("{} {} ({}%)", amount_label, decision.amount, decision.percentage);
    println!("Time left:  {}", decision.time_remaining);
    println!("Message:    {}", decision.message);
}

/// Read the calendar snapshot from a file or stdin and reject inverted windows.
fn load_snapshot(path: Option<&str>) -> Result<CalendarSnapshot> {
    let raw = read_input(path)?;
    let snapshot: CalendarSnapshot =
        serde_json::from_str(&raw).context("Failed to parse calendar snapshot JSON")?;
    snapshot.validate().context("Invalid calendar snapshot")?;
    Ok(snapshot)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
