//! Minute-aligned clock display
//!
//! Renders `HH:MM | <date>` into the `current-time` element once at startup,
//! again on the next full minute, and every 60 seconds after that.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use log::debug;

use crate::document::{ids, Document, Node};
use crate::scheduler::{task, Scheduler, WallClock};

/// Period of the clock tick
pub const MINUTE: Duration = Duration::from_secs(60);

/// Date format of the German locale the dashboard targets
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// How the minute separator is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DisplayVariant {
    /// Plain text, no animation (e-ink panels)
    #[default]
    Eink,
    /// Separator marked for a blink animation
    Blink,
}

/// Formats the date part of `now`.
///
/// Returns `None` when the format cannot be applied to a local wall time,
/// e.g. it asks for a zone (`%Z`, `%z`) or has an unknown specifier.
pub fn format_date(now: NaiveDateTime, date_format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", now.format(date_format)).ok()?;
    Some(out)
}

/// Clock reading taken at render time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockSnapshot {
    pub hours: String,
    pub minutes: String,
    pub date: String,
}

impl ClockSnapshot {
    /// Takes a reading of `now`, formatting the date with a chrono format string
    pub fn at(now: NaiveDateTime, date_format: &str) -> Self {
        Self {
            hours: format!("{:02}", now.hour()),
            minutes: format!("{:02}", now.minute()),
            date: format_date(now, date_format)
                .or_else(|| format_date(now, DEFAULT_DATE_FORMAT))
                .unwrap_or_default(),
        }
    }

    /// Builds the element content for a display variant
    pub fn nodes(&self, variant: DisplayVariant) -> Vec<Node> {
        match variant {
            DisplayVariant::Eink => vec![Node::Text(self.to_string())],
            DisplayVariant::Blink => vec![
                Node::Text(self.hours.clone()),
                Node::Blink(":".to_string()),
                Node::Text(format!("{} | {}", self.minutes, self.date)),
            ],
        }
    }
}

impl std::fmt::Display for ClockSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} | {}", self.hours, self.minutes, self.date)
    }
}

/// Presentation settings of the clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    pub variant: DisplayVariant,
    /// chrono format string for the date part
    pub date_format: String,
}

impl Default for ClockFace {
    fn default() -> Self {
        Self {
            variant: DisplayVariant::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl ClockFace {
    /// Overwrites `current-time` with the reading of `now`. No-op when the
    /// page has no such element.
    pub fn render(&self, doc: &Document, now: NaiveDateTime) {
        let snapshot = ClockSnapshot::at(now, &self.date_format);
        doc.set_nodes(ids::CURRENT_TIME, snapshot.nodes(self.variant));
    }
}

/// Delay from `now` until the next full minute.
///
/// Exactly on a minute boundary this is a whole minute, never zero.
pub fn alignment_delay(now: NaiveDateTime) -> Duration {
    Duration::from_secs(60 - u64::from(now.second()))
}

/// Starts the clock loop: renders immediately, then on the next full minute,
/// then every minute for the lifetime of the process.
pub fn start_clock(
    scheduler: Arc<dyn Scheduler>,
    wall_clock: Arc<dyn WallClock>,
    face: ClockFace,
    doc: Document,
) {
    let delay = alignment_delay(wall_clock.now());
    let render = move || face.render(&doc, wall_clock.now());

    // Never leave the display blank while waiting for the boundary
    render();
    debug!("Clock aligned, first tick in {}s", delay.as_secs());

    let tick = task(move || {
        render();
        async {}
    });
    let repeating = scheduler.clone();
    scheduler.run_after(
        delay,
        task(move || {
            let tick = tick.clone();
            let repeating = repeating.clone();
            async move {
                tick().await;
                repeating.run_every(MINUTE, tick);
            }
        }),
    );
}
