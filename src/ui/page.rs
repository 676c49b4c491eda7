//! Status page rendering
//!
//! Draws the document onto the terminal: the clock header, the weather panel
//! and the departure table. Elements are read as they are; empty ones show
//! a dash.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell as TableCell, Paragraph, Row as TableRow, Table},
    Frame,
};

use crate::document::{ids, Document, Element, Node};

/// Shown for an element that has not been filled yet
const EMPTY: &str = "--";

/// Converts inline nodes to styled spans
fn spans(nodes: &[Node], base: Style) -> Vec<Span<'static>> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Text(s) => Span::styled(s.clone(), base),
            Node::Blink(s) => Span::styled(s.clone(), base.add_modifier(Modifier::SLOW_BLINK)),
            Node::Emphasis(s) => Span::styled(s.clone(), base.add_modifier(Modifier::ITALIC)),
        })
        .collect()
}

/// Styled content of an inline element, or a dash when empty or absent
fn inline(doc: &Document, id: &str, base: Style) -> Vec<Span<'static>> {
    match doc.get(id) {
        Some(Element::Inline(nodes)) if !nodes.is_empty() => spans(&nodes, base),
        _ => vec![Span::styled(EMPTY, Style::default().fg(Color::DarkGray))],
    }
}

/// Renders the whole status page
pub fn render_page(frame: &mut Frame, doc: &Document) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Clock
            Constraint::Length(5), // Weather
            Constraint::Min(3),    // Departures
            Constraint::Length(1), // Help text
        ])
        .split(area);

    render_clock(frame, doc, chunks[0]);
    render_weather(frame, doc, chunks[1]);
    render_departures(frame, doc, chunks[2]);

    let help = Paragraph::new(Line::from(Span::styled(
        "q quit",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(help, chunks[3]);
}

fn render_clock(frame: &mut Frame, doc: &Document, area: Rect) {
    let base = Style::default().add_modifier(Modifier::BOLD);
    let clock = Paragraph::new(Line::from(inline(doc, ids::CURRENT_TIME, base)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(clock, area);
}

fn render_weather(frame: &mut Frame, doc: &Document, area: Rect) {
    let plain = Style::default();
    let bold = plain.add_modifier(Modifier::BOLD);
    let mut temperatures = inline(doc, ids::CURRENT_TEMPERATURE, bold);
    temperatures.push(Span::raw("   "));
    temperatures.extend(inline(doc, ids::MAX_TEMPERATURE, plain));
    temperatures.push(Span::raw("   "));
    temperatures.extend(inline(doc, ids::MIN_TEMPERATURE, plain));

    let mut sun = vec![Span::raw("Sonnenaufgang ")];
    sun.extend(inline(doc, ids::SUNRISE, plain));
    sun.push(Span::raw("   Sonnenuntergang "));
    sun.extend(inline(doc, ids::SUNSET, plain));

    let lines = vec![
        Line::from(temperatures),
        Line::from(inline(doc, ids::UV_INDEX, plain)),
        Line::from(sun),
    ];
    let weather = Paragraph::new(lines)
        .block(Block::default().title(" Wetter ").borders(Borders::ALL));
    frame.render_widget(weather, area);
}

fn render_departures(frame: &mut Frame, doc: &Document, area: Rect) {
    let body = match doc.get(ids::FIRST_MONITOR_BODY) {
        Some(Element::TableBody(rows)) => rows,
        _ => Vec::new(),
    };
    let block = Block::default().title(" Abfahrten ").borders(Borders::ALL);

    // A lone full-width cell (the "no data" row) is drawn across the panel
    let spanning = match body.as_slice() {
        [row] => match row.cells.as_slice() {
            [cell] if cell.colspan > 1 => Some(cell),
            _ => None,
        },
        _ => None,
    };
    if let Some(cell) = spanning {
        let placeholder = Paragraph::new(Line::from(spans(&cell.nodes, Style::default())))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let rows: Vec<TableRow> = body
        .iter()
        .map(|row| {
            TableRow::new(
                row.cells
                    .iter()
                    .map(|cell| TableCell::from(Line::from(spans(&cell.nodes, Style::default())))),
            )
        })
        .collect();
    let header = TableRow::new(["Linie", "Ziel", "Abfahrt"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(12),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

/// Plain-text rendering of the page, one element per line
pub fn page_text(doc: &Document) -> String {
    let mut lines: Vec<String> = ids::INLINE
        .iter()
        .map(|id| format!("{}: {}", id, doc.text(id).unwrap_or_default()))
        .collect();
    if let Some(body) = doc.text(ids::FIRST_MONITOR_BODY) {
        lines.push(format!("{}:", ids::FIRST_MONITOR_BODY));
        lines.extend(body.lines().map(|row| format!("  {}", row)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transport::render_transport;
    use crate::data::weather::render_weather as fill_weather;
    use crate::data::{TransportSnapshot, WeatherSnapshot};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(doc: &Document) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_page(frame, doc)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_blank_page_renders_sections() {
        let content = buffer_text(&Document::dashboard());
        assert!(content.contains("Wetter"), "Should render weather title");
        assert!(content.contains("Abfahrten"), "Should render departures title");
        assert!(content.contains("--"), "Empty elements show a dash");
    }

    #[test]
    fn test_filled_page_shows_values() {
        let doc = Document::dashboard();
        doc.set_text(ids::CURRENT_TIME, "12:34 | 19.10.2026");
        let weather = r#"{"current_temperature":21,"max_temperature":25,"min_temperature":14}"#;
        fill_weather(&WeatherSnapshot::parse(weather).unwrap(), &doc);
        let departures = r#"{"first":[{"line":"U3","destination":"Moosach","minutes":4}]}"#;
        render_transport(&TransportSnapshot::parse(departures).unwrap(), &doc);

        let content = buffer_text(&doc);
        assert!(content.contains("12:34 | 19.10.2026"));
        assert!(content.contains("21°C"));
        assert!(content.contains("H: 25 °C"));
        assert!(content.contains("U3"));
        assert!(content.contains("Moosach"));
        assert!(content.contains("4 min"));
    }

    #[test]
    fn test_placeholder_row_is_drawn() {
        let doc = Document::dashboard();
        render_transport(&TransportSnapshot::default(), &doc);
        assert!(buffer_text(&doc).contains("Keine Daten"));
    }

    #[test]
    fn test_page_text_lists_elements() {
        let doc = Document::dashboard();
        doc.set_text(ids::SUNSET, "18:17");
        render_transport(&TransportSnapshot::default(), &doc);

        let text = page_text(&doc);
        assert!(text.contains("sunset: 18:17"));
        assert!(text.contains("first-monitor-body:\n  Keine Daten"));
    }
}
