//! UI rendering module for statusboard
//!
//! Draws the page document onto the terminal using ratatui.

pub mod page;

pub use page::{page_text, render_page};
