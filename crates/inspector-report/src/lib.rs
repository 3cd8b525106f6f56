//! inspector-report — Renderers for a finished grade report.
//!
//! The engine hands over a [`GradeReport`](inspector_core::report::GradeReport);
//! these modules turn it into plain text, a self-contained HTML page, or a
//! JSON log line.

pub mod html;
pub mod log;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures;

pub use html::{generate_html, write_html_report};
pub use log::{append_log, LOG_FILE};
pub use text::render_text;
