//! Transport departures feed
//!
//! Polls `/transport_data` and rebuilds the departure table from scratch on
//! every snapshot.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::{FeedError, Fetch, Poller};
use crate::document::{ids, Cell, Document, Node, Row};

/// Label of the row shown when a monitor has no departures
pub const NO_DATA_LABEL: &str = "Keine Daten";

/// Columns of a departure table: line, destination, minutes
pub const COLUMNS: u16 = 3;

/// One upcoming departure.
///
/// Fields the server left out or sent with an unexpected type are `None` and
/// render as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartureRecord {
    pub line: Option<String>,
    pub destination: Option<String>,
    /// Minutes until departure, as the server wrote the number
    pub minutes: Option<String>,
}

impl DepartureRecord {
    /// Reads a record leniently from a JSON value
    pub fn from_value(value: &Value) -> Self {
        Self {
            line: text_field(value, "line"),
            destination: text_field(value, "destination"),
            minutes: minutes_field(value),
        }
    }

    /// Table row for this departure
    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Cell::text(self.line.clone().unwrap_or_default()),
            Cell::text(self.destination.clone().unwrap_or_default()),
            Cell::text(
                self.minutes
                    .as_ref()
                    .map(|m| format!("{} min", m))
                    .unwrap_or_default(),
            ),
        ])
    }
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads `minutes` without rounding. Whole numbers lose a trailing `.0`;
/// strings count only when they hold a number.
fn minutes_field(value: &Value) -> Option<String> {
    match value.get("minutes")? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| f.to_string()),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|_| s.to_string())
        }
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct TransportPayload {
    #[serde(default)]
    first: Option<Value>,
}

/// Parsed `/transport_data` payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportSnapshot {
    /// Departures of the first monitor in server order; `None` when absent
    pub first: Option<Vec<DepartureRecord>>,
}

impl TransportSnapshot {
    /// Parses a response body.
    ///
    /// Only a body that is not a JSON object fails. A missing or non-array
    /// `first` reads as absent, and malformed records are kept with empty
    /// fields.
    pub fn parse(body: &str) -> Result<Self, FeedError> {
        let payload: TransportPayload = serde_json::from_str(body)?;
        let first = match payload.first {
            Some(Value::Array(items)) => {
                Some(items.iter().map(DepartureRecord::from_value).collect())
            }
            _ => None,
        };
        Ok(Self { first })
    }
}

/// Row shown in place of departures when there are none
pub fn placeholder_row() -> Row {
    Row::new(vec![Cell::spanning(
        vec![Node::Emphasis(NO_DATA_LABEL.to_string())],
        COLUMNS,
    )])
}

/// Replaces the rows of table body `body_id` with `departures`.
///
/// An empty or absent list yields exactly one placeholder row. Never fails;
/// a page without the table body is left alone.
pub fn render_departures(departures: Option<&[DepartureRecord]>, doc: &Document, body_id: &str) {
    let rows = match departures {
        Some(list) if !list.is_empty() => list.iter().map(DepartureRecord::to_row).collect(),
        _ => vec![placeholder_row()],
    };
    doc.replace_rows(body_id, rows);
}

/// Writes a transport snapshot into the document
pub fn render_transport(snapshot: &TransportSnapshot, doc: &Document) {
    render_departures(snapshot.first.as_deref(), doc, ids::FIRST_MONITOR_BODY);
}

/// Poller for the transport endpoint
#[derive(Clone)]
pub struct TransportPoller {
    fetch: Arc<dyn Fetch>,
    url: Url,
}

impl TransportPoller {
    /// Creates a poller for `url`, which already carries the forwarded query
    pub fn new(fetch: Arc<dyn Fetch>, url: Url) -> Self {
        Self { fetch, url }
    }
}

impl Poller for TransportPoller {
    type Snapshot = TransportSnapshot;

    const FEED: &'static str = "transport";

    fn poll(&self) -> BoxFuture<'static, Result<TransportSnapshot, FeedError>> {
        let body = self.fetch.get(self.url.clone());
        async move { TransportSnapshot::parse(&body.await?) }.boxed()
    }

    fn render(&self, snapshot: &TransportSnapshot, doc: &Document) {
        render_transport(snapshot, doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    fn rows(doc: &Document) -> Vec<Row> {
        match doc.get(ids::FIRST_MONITOR_BODY) {
            Some(Element::TableBody(rows)) => rows,
            other => panic!("Expected table body, got {:?}", other),
        }
    }

    fn render_body(body: &str) -> Document {
        let doc = Document::dashboard();
        render_transport(&TransportSnapshot::parse(body).unwrap(), &doc);
        doc
    }

    #[test]
    fn test_single_departure_row() {
        let doc = render_body(
            r#"{"first":[{"line":"U3","destination":"Fürstenried West","minutes":4}]}"#,
        );
        let rows = rows(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(), "U3 | Fürstenried West | 4 min");
    }

    #[test]
    fn test_empty_list_renders_placeholder() {
        let doc = render_body(r#"{"first":[]}"#);
        let rows = rows(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells.len(), 1);
        assert_eq!(rows[0].cells[0].colspan, COLUMNS);
        assert_eq!(rows[0].text(), "Keine Daten");
        assert_eq!(
            doc.markup(ids::FIRST_MONITOR_BODY).as_deref(),
            Some("<tr><td colspan=\"3\"><em>Keine Daten</em></td></tr>")
        );
    }

    #[test]
    fn test_absent_list_renders_placeholder() {
        for body in [r#"{}"#, r#"{"first":null}"#, r#"{"first":"soon"}"#] {
            let rows = rows(&render_body(body));
            assert_eq!(rows, vec![placeholder_row()], "body: {}", body);
        }
    }

    #[test]
    fn test_rows_preserve_server_order() {
        let doc = render_body(
            r#"{"first":[
                {"line":"U6","destination":"Garching-Forschungszentrum","minutes":2},
                {"line":"230","destination":"Nordfriedhof","minutes":7},
                {"line":"U6","destination":"Klinikum Großhadern","minutes":11}
            ]}"#,
        );
        let texts: Vec<String> = rows(&doc).iter().map(Row::text).collect();
        assert_eq!(
            texts,
            vec![
                "U6 | Garching-Forschungszentrum | 2 min",
                "230 | Nordfriedhof | 7 min",
                "U6 | Klinikum Großhadern | 11 min",
            ]
        );
    }

    #[test]
    fn test_previous_rows_are_cleared() {
        let doc = render_body(
            r#"{"first":[
                {"line":"U3","destination":"Moosach","minutes":1},
                {"line":"U3","destination":"Moosach","minutes":11}
            ]}"#,
        );
        render_transport(&TransportSnapshot::parse(r#"{"first":[]}"#).unwrap(), &doc);
        assert_eq!(rows(&doc), vec![placeholder_row()]);

        let next = r#"{"first":[{"line":"S8","destination":"Flughafen","minutes":9}]}"#;
        render_transport(&TransportSnapshot::parse(next).unwrap(), &doc);
        let rows = rows(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text(), "S8 | Flughafen | 9 min");
    }

    #[test]
    fn test_malformed_records_render_empty_cells() {
        let doc = render_body(
            r#"{"first":[
                {"destination":"Messestadt Ost","minutes":3},
                42,
                {"line":"N40","destination":null,"minutes":"soon"}
            ]}"#,
        );
        let texts: Vec<String> = rows(&doc).iter().map(Row::text).collect();
        assert_eq!(
            texts,
            vec![" | Messestadt Ost | 3 min", " |  | ", "N40 |  | "]
        );
    }

    #[test]
    fn test_numeric_line_is_kept() {
        let record = DepartureRecord::from_value(&serde_json::json!({
            "line": 230, "destination": "Nordfriedhof", "minutes": 4.0
        }));
        assert_eq!(record.line.as_deref(), Some("230"));
        assert_eq!(record.minutes.as_deref(), Some("4"));
    }

    #[test]
    fn test_minutes_are_shown_as_sent() {
        let doc = render_body(
            r#"{"first":[
                {"line":"U6","destination":"Fröttmaning","minutes":4.5},
                {"line":"U6","destination":"Fröttmaning","minutes":"12"},
                {"line":"U6","destination":"Fröttmaning","minutes":0}
            ]}"#,
        );
        let texts: Vec<String> = rows(&doc).iter().map(Row::text).collect();
        assert_eq!(
            texts,
            vec![
                "U6 | Fröttmaning | 4.5 min",
                "U6 | Fröttmaning | 12 min",
                "U6 | Fröttmaning | 0 min"
            ]
        );
    }

    #[test]
    fn test_non_object_body_is_parse_error() {
        assert!(matches!(
            TransportSnapshot::parse("Internal Server Error"),
            Err(FeedError::Parse(_))
        ));
        assert!(matches!(
            TransportSnapshot::parse("null"),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn test_render_is_idempotent() {
        let body = r#"{"first":[{"line":"U3","destination":"Fürstenried West","minutes":4}]}"#;
        let doc = render_body(body);
        let first = doc.markup(ids::FIRST_MONITOR_BODY);
        render_transport(&TransportSnapshot::parse(body).unwrap(), &doc);
        assert_eq!(doc.markup(ids::FIRST_MONITOR_BODY), first);
    }

    #[test]
    fn test_render_without_table_is_noop() {
        let doc = Document::new();
        render_transport(&TransportSnapshot::default(), &doc);
        assert!(doc.get(ids::FIRST_MONITOR_BODY).is_none());
    }
}
