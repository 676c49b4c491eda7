//! In-memory page document
//!
//! Stands in for the browser DOM of the status page: a fixed set of
//! addressable elements, each holding either inline content or a table body.
//! Writes addressed to an id the page does not carry are ignored, so every
//! renderer tolerates a trimmed-down page.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Element ids the refresh engine reads and writes
pub mod ids {
    pub const CURRENT_TIME: &str = "current-time";
    pub const CURRENT_TEMPERATURE: &str = "current-temperature";
    pub const MAX_TEMPERATURE: &str = "max-temperature";
    pub const MIN_TEMPERATURE: &str = "min-temperature";
    pub const UV_INDEX: &str = "uv-index";
    pub const SUNRISE: &str = "sunrise";
    pub const SUNSET: &str = "sunset";
    pub const FIRST_MONITOR_BODY: &str = "first-monitor-body";

    /// Ids holding inline content on the dashboard page
    pub const INLINE: [&str; 7] = [
        CURRENT_TIME,
        CURRENT_TEMPERATURE,
        MAX_TEMPERATURE,
        MIN_TEMPERATURE,
        UV_INDEX,
        SUNRISE,
        SUNSET,
    ];
}

/// A piece of inline content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Plain text
    Text(String),
    /// Text carrying the blink animation marker
    Blink(String),
    /// Emphasized text
    Emphasis(String),
}

impl Node {
    /// Returns the text carried by this node, without decoration
    pub fn text(&self) -> &str {
        match self {
            Node::Text(s) | Node::Blink(s) | Node::Emphasis(s) => s,
        }
    }

    fn write_markup(&self, out: &mut String) {
        match self {
            Node::Text(s) => out.push_str(&escape(s)),
            Node::Blink(s) => {
                out.push_str("<span class=\"blink\">");
                out.push_str(&escape(s));
                out.push_str("</span>");
            }
            Node::Emphasis(s) => {
                out.push_str("<em>");
                out.push_str(&escape(s));
                out.push_str("</em>");
            }
        }
    }
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub nodes: Vec<Node>,
    /// Number of columns this cell covers
    pub colspan: u16,
}

impl Cell {
    /// Creates a single-column cell holding plain text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::Text(text.into())],
            colspan: 1,
        }
    }

    /// Creates a cell covering `colspan` columns
    pub fn spanning(nodes: Vec<Node>, colspan: u16) -> Self {
        Self { nodes, colspan }
    }

    /// Returns the undecorated text of the cell
    pub fn plain_text(&self) -> String {
        self.nodes.iter().map(Node::text).collect()
    }
}

/// A table row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Returns the row's cell texts joined with `" | "`
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(Cell::plain_text)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Content of one addressable element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Inline(Vec<Node>),
    TableBody(Vec<Row>),
}

impl Element {
    /// Returns the undecorated text content, rows separated by newlines
    pub fn text_content(&self) -> String {
        match self {
            Element::Inline(nodes) => nodes.iter().map(Node::text).collect(),
            Element::TableBody(rows) => rows
                .iter()
                .map(Row::text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Serializes the element's inner content to HTML-like markup
    pub fn markup(&self) -> String {
        let mut out = String::new();
        match self {
            Element::Inline(nodes) => {
                for node in nodes {
                    node.write_markup(&mut out);
                }
            }
            Element::TableBody(rows) => {
                for row in rows {
                    out.push_str("<tr>");
                    for cell in &row.cells {
                        if cell.colspan > 1 {
                            out.push_str(&format!("<td colspan=\"{}\">", cell.colspan));
                        } else {
                            out.push_str("<td>");
                        }
                        for node in &cell.nodes {
                            node.write_markup(&mut out);
                        }
                        out.push_str("</td>");
                    }
                    out.push_str("</tr>");
                }
            }
        }
        out
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared handle to the page's elements
///
/// Cloning the handle shares the same elements. Each write replaces one
/// element wholesale under a short-lived lock.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Arc<Mutex<BTreeMap<String, Element>>>,
}

impl Document {
    /// Creates a document without any elements
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the dashboard page: every inline id empty, plus the first
    /// monitor's table body
    pub fn dashboard() -> Self {
        let doc = Self::new();
        for id in ids::INLINE {
            doc.add_inline(id);
        }
        doc.add_table_body(ids::FIRST_MONITOR_BODY);
        doc
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Element>> {
        // Writers replace whole elements, so a poisoned map is still consistent
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an empty inline element
    pub fn add_inline(&self, id: &str) {
        self.lock()
            .insert(id.to_string(), Element::Inline(Vec::new()));
    }

    /// Adds an empty table body
    pub fn add_table_body(&self, id: &str) {
        self.lock()
            .insert(id.to_string(), Element::TableBody(Vec::new()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Element> {
        self.lock().get(id).cloned()
    }

    /// Returns the text content of an element
    pub fn text(&self, id: &str) -> Option<String> {
        self.lock().get(id).map(Element::text_content)
    }

    /// Returns the markup of an element
    pub fn markup(&self, id: &str) -> Option<String> {
        self.lock().get(id).map(Element::markup)
    }

    /// Replaces an inline element's content with plain text.
    ///
    /// Returns `false` without touching anything when the id is absent.
    pub fn set_text(&self, id: &str, text: impl Into<String>) -> bool {
        self.set_nodes(id, vec![Node::Text(text.into())])
    }

    /// Replaces an inline element's content.
    ///
    /// Returns `false` without touching anything when the id is absent.
    pub fn set_nodes(&self, id: &str, nodes: Vec<Node>) -> bool {
        match self.lock().get_mut(id) {
            Some(element) => {
                *element = Element::Inline(nodes);
                true
            }
            None => false,
        }
    }

    /// Clears a table body and fills it with `rows` in one step.
    ///
    /// Returns `false` when the id is absent or does not name a table body.
    pub fn replace_rows(&self, id: &str, rows: Vec<Row>) -> bool {
        match self.lock().get_mut(id) {
            Some(Element::TableBody(body)) => {
                *body = rows;
                true
            }
            _ => false,
        }
    }
}
