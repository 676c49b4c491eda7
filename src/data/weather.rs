//! Weather feed
//!
//! Polls `/weather_data` and maps the snapshot onto the six weather regions
//! of the page. Regions whose field is missing keep what they showed.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use reqwest::Url;
use serde::de::Error as _;
use serde_json::Value;

use super::{FeedError, Fetch, Poller};
use crate::document::{ids, Document};

/// Naive timestamp layouts accepted for sunrise and sunset
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parsed `/weather_data` payload.
///
/// Every field is optional. A field with an unusable value reads as absent,
/// so it only affects its own region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherSnapshot {
    /// Current temperature in Celsius
    pub current_temperature: Option<f64>,
    /// Today's maximum in Celsius
    pub max_temperature: Option<f64>,
    /// Today's minimum in Celsius
    pub min_temperature: Option<f64>,
    /// Maximum UV index of the day
    pub uv_index_max: Option<f64>,
    /// Which day the UV value refers to (e.g. "heute")
    pub uv_day_label: Option<String>,
    /// ISO-8601 sunrise timestamp
    pub sunrise: Option<String>,
    /// ISO-8601 sunset timestamp
    pub sunset: Option<String>,
    /// Set by the server when its own upstream fetch failed
    pub error: Option<Value>,
}

impl WeatherSnapshot {
    /// Parses a response body.
    ///
    /// A payload carrying a truthy `error` yields [`FeedError::Upstream`].
    /// Only a body that is not a JSON object fails to parse.
    pub fn parse(body: &str) -> Result<Self, FeedError> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            let err = serde_json::Error::custom("expected a JSON object");
            return Err(FeedError::Parse(err));
        }
        let snapshot = Self::from_value(&value);
        match snapshot.upstream_error() {
            Some(message) => Err(FeedError::Upstream(message)),
            None => Ok(snapshot),
        }
    }

    /// Reads each field on its own from a JSON object
    pub fn from_value(value: &Value) -> Self {
        Self {
            current_temperature: number_field(value, "current_temperature"),
            max_temperature: number_field(value, "max_temperature"),
            min_temperature: number_field(value, "min_temperature"),
            uv_index_max: number_field(value, "uv_index_max"),
            uv_day_label: label_field(value, "uv_day_label"),
            sunrise: label_field(value, "sunrise"),
            sunset: label_field(value, "sunset"),
            error: value.get("error").cloned(),
        }
    }

    /// Returns the error message when `error` is truthy
    pub fn upstream_error(&self) -> Option<String> {
        let value = self.error.as_ref().filter(|v| is_truthy(v))?;
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Reads a number, also from a numeric string
fn number_field(value: &Value, key: &str) -> Option<f64> {
    let number = match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite());
    if number.is_none() {
        debug!("Ignoring weather field {} with unusable value", key);
    }
    number
}

/// Reads a string, also from a number
fn label_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON truthiness: null, false, zero and "" are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Parses a sunrise/sunset timestamp into local wall time.
///
/// Timestamps with an offset are converted to the local zone; naive ones are
/// taken as local already.
pub fn parse_timestamp(raw: &str) -> Option<NaiveTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).time());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|dt| dt.time())
}

/// Writes a weather snapshot into the document.
///
/// Each region is written only when both its element and its field are
/// present.
pub fn render_weather(snapshot: &WeatherSnapshot, doc: &Document) {
    if let Some(t) = snapshot.current_temperature {
        doc.set_text(ids::CURRENT_TEMPERATURE, format!("{}°C", t));
    }
    if let Some(t) = snapshot.max_temperature {
        doc.set_text(ids::MAX_TEMPERATURE, format!("H: {} °C", t));
    }
    if let Some(t) = snapshot.min_temperature {
        doc.set_text(ids::MIN_TEMPERATURE, format!("L: {} °C", t));
    }
    if let Some(uv) = snapshot.uv_index_max {
        let text = match &snapshot.uv_day_label {
            Some(label) => format!("UV {}: {}", label, uv),
            None => format!("UV: {}", uv),
        };
        doc.set_text(ids::UV_INDEX, text);
    }
    render_sun_time(doc, ids::SUNRISE, snapshot.sunrise.as_deref());
    render_sun_time(doc, ids::SUNSET, snapshot.sunset.as_deref());
}

fn render_sun_time(doc: &Document, id: &str, raw: Option<&str>) {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return;
    };
    match parse_timestamp(raw) {
        Some(time) => {
            doc.set_text(id, time.format("%H:%M").to_string());
        }
        None => warn!("Skipping unparseable {} timestamp: {}", id, raw),
    }
}

/// Poller for the weather endpoint
#[derive(Clone)]
pub struct WeatherPoller {
    fetch: Arc<dyn Fetch>,
    url: Url,
}

impl WeatherPoller {
    pub fn new(fetch: Arc<dyn Fetch>, url: Url) -> Self {
        Self { fetch, url }
    }
}

impl Poller for WeatherPoller {
    type Snapshot = WeatherSnapshot;

    const FEED: &'static str = "weather";

    fn poll(&self) -> BoxFuture<'static, Result<WeatherSnapshot, FeedError>> {
        let body = self.fetch.get(self.url.clone());
        async move { WeatherSnapshot::parse(&body.await?) }.boxed()
    }

    fn render(&self, snapshot: &WeatherSnapshot, doc: &Document) {
        render_weather(snapshot, doc);
    }
}
