//! statusboard library
//!
//! Refresh engine of an e-ink style status display: a minute-aligned clock,
//! a weather feed and a transit departures feed, each on its own cadence,
//! rendered into an in-memory page document.

pub mod cli;
pub mod clock;
pub mod data;
pub mod document;
pub mod logging;
pub mod refresh;
pub mod scheduler;
pub mod ui;
