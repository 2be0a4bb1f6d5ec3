//! Output module for writing crawl reports
//!
//! This module handles:
//! - Resolving sink identifiers (`[format:]destination`) to concrete sinks
//! - Rendering reports as text, markdown or JSON
//! - Writing one report to several independent sinks

mod json;
mod markdown;
mod sink;
mod text;
mod traits;

pub use json::{format_json_report, JsonRenderer};
pub use markdown::{format_markdown_report, MarkdownRenderer};
pub use sink::{write_report, SinkDestination, SinkFailure, SinkFormat, SinkSpec};
pub use text::{format_text_report, TextRenderer};
pub use traits::{OutputError, OutputResult, ReportRenderer};
