//! Background refresh of the dashboard
//!
//! Starts the three independent loops (clock, weather, transport) on one
//! scheduler. Each loop owns its cadence and writes only its own elements.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::clock::{start_clock, ClockFace};
use crate::data::{start_polling, Endpoints, Fetch, HttpFetch, TransportPoller, WeatherPoller};
use crate::document::Document;
use crate::scheduler::{Scheduler, SystemClock, TokioScheduler, WallClock};

/// Configuration for refresh intervals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Interval for weather data refresh
    pub weather_interval: Duration,
    /// Interval for departures refresh
    pub transport_interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            weather_interval: Duration::from_secs(900), // 15 minutes
            transport_interval: Duration::from_secs(60), // e-ink friendly
        }
    }
}

/// The refresh engine of one page
pub struct Dashboard {
    document: Document,
    endpoints: Endpoints,
    face: ClockFace,
    config: RefreshConfig,
    scheduler: Arc<dyn Scheduler>,
    wall_clock: Arc<dyn WallClock>,
    fetch: Arc<dyn Fetch>,
}

impl Dashboard {
    /// Creates a dashboard on tokio timers, the system clock and HTTP
    pub fn new(document: Document, endpoints: Endpoints, face: ClockFace) -> Self {
        Self {
            document,
            endpoints,
            face,
            config: RefreshConfig::default(),
            scheduler: Arc::new(TokioScheduler),
            wall_clock: Arc::new(SystemClock),
            fetch: Arc::new(HttpFetch::new()),
        }
    }

    /// Replaces the refresh intervals
    pub fn with_config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the scheduler driving all loops
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the clock the time display reads
    pub fn with_wall_clock(mut self, wall_clock: Arc<dyn WallClock>) -> Self {
        self.wall_clock = wall_clock;
        self
    }

    /// Replaces the HTTP fetcher used by both feeds
    pub fn with_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Starts the clock, weather and transport loops.
    ///
    /// The clock renders before this returns; each feed's first fetch is
    /// scheduled right away. Loops run until the process ends.
    pub fn start(&self) {
        start_clock(
            self.scheduler.clone(),
            self.wall_clock.clone(),
            self.face.clone(),
            self.document.clone(),
        );
        start_polling(
            Arc::new(WeatherPoller::new(
                self.fetch.clone(),
                self.endpoints.weather().clone(),
            )),
            self.config.weather_interval,
            &*self.scheduler,
            self.document.clone(),
        );
        start_polling(
            Arc::new(TransportPoller::new(
                self.fetch.clone(),
                self.endpoints.transport().clone(),
            )),
            self.config.transport_interval,
            &*self.scheduler,
            self.document.clone(),
        );
        info!(
            "Dashboard started: weather from {}, departures from {}",
            self.endpoints.weather(),
            self.endpoints.transport()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.weather_interval, Duration::from_secs(900));
        assert_eq!(config.transport_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_refresh_config_custom() {
        let config = RefreshConfig {
            weather_interval: Duration::from_secs(60),
            transport_interval: Duration::from_secs(30),
        };
        assert_eq!(config.weather_interval, Duration::from_secs(60));
        assert_eq!(config.transport_interval, Duration::from_secs(30));
    }
}
