//! Sink identifiers and the multi-sink writer

use crate::config::OutputConfiguration;
use crate::output::json::JsonRenderer;
use crate::output::markdown::MarkdownRenderer;
use crate::output::text::TextRenderer;
use crate::output::traits::{OutputError, OutputResult, ReportRenderer};
use crate::report::CrawlReport;
use crate::ConfigError;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Rendering format of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Text,
    Markdown,
    Json,
}

impl SinkFormat {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infers the format from a file extension; unknown extensions are text
    fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("md") | Some("markdown") => Self::Markdown,
            _ => Self::Text,
        }
    }

    fn renderer(&self) -> &'static dyn ReportRenderer {
        match self {
            Self::Text => &TextRenderer,
            Self::Markdown => &MarkdownRenderer,
            Self::Json => &JsonRenderer,
        }
    }
}

/// Where a sink writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDestination {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl fmt::Display for SinkDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved sink identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSpec {
    pub format: SinkFormat,
    pub destination: SinkDestination,
}

impl SinkSpec {
    /// Parses a sink identifier of the form `[format:]destination`
    ///
    /// # Resolution
    ///
    /// | Identifier | Format | Destination |
    /// |------------|--------|-------------|
    /// | `stdout`, `stderr` | text | stream |
    /// | `report.json` | JSON (by extension) | file |
    /// | `md:stdout` | markdown | stdout |
    /// | `json:out.txt` | JSON | file |
    ///
    /// A prefix that is not a known format is an error, except for a single
    /// letter (a Windows drive such as `C:`).
    ///
    /// # Examples
    ///
    /// ```
    /// use smoke_crawler::output::{SinkDestination, SinkFormat, SinkSpec};
    ///
    /// let sink = SinkSpec::parse("markdown:report.txt").unwrap();
    /// assert_eq!(sink.format, SinkFormat::Markdown);
    ///
    /// let sink = SinkSpec::parse("stderr").unwrap();
    /// assert_eq!(sink.destination, SinkDestination::Stderr);
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::InvalidSink("empty sink identifier".to_string()));
        }

        let (format, destination) = match raw.split_once(':') {
            Some((prefix, rest)) if prefix.len() > 1 => match SinkFormat::from_prefix(prefix) {
                Some(format) => (Some(format), rest.trim()),
                None => {
                    return Err(ConfigError::InvalidSink(format!(
                        "unknown format '{}' in '{}'",
                        prefix, raw
                    )))
                }
            },
            _ => (None, raw),
        };

        if destination.is_empty() {
            return Err(ConfigError::InvalidSink(format!(
                "missing destination in '{}'",
                raw
            )));
        }

        let destination = match destination.to_ascii_lowercase().as_str() {
            "stdout" | "-" => SinkDestination::Stdout,
            "stderr" => SinkDestination::Stderr,
            _ => SinkDestination::File(PathBuf::from(destination)),
        };

        let format = format.unwrap_or_else(|| match &destination {
            SinkDestination::File(path) => SinkFormat::from_path(path),
            _ => SinkFormat::Text,
        });

        Ok(Self {
            format,
            destination,
        })
    }

    /// Renders the report and writes it to the destination
    pub fn write(&self, report: &CrawlReport, output: &OutputConfiguration) -> OutputResult<()> {
        let rendered = self.format.renderer().render(report, &output.filters)?;

        match &self.destination {
            SinkDestination::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
            SinkDestination::Stderr => {
                let mut stderr = std::io::stderr().lock();
                stderr.write_all(rendered.as_bytes())?;
            }
            SinkDestination::File(path) => {
                let mut file = File::create(path)?;
                file.write_all(rendered.as_bytes())?;
            }
        }

        Ok(())
    }
}

/// A sink that could not be written
#[derive(Debug)]
pub struct SinkFailure {
    /// The sink identifier as configured
    pub sink: String,
    pub error: OutputError,
}

/// Writes the report to every configured sink
///
/// Sinks are independent: a failing sink is collected and the remaining
/// sinks are still written.
///
/// # Returns
///
/// The failures, empty if every sink was written
pub fn write_report(report: &CrawlReport, output: &OutputConfiguration) -> Vec<SinkFailure> {
    let mut failures = Vec::new();

    for identifier in &output.outputs {
        let result = SinkSpec::parse(identifier)
            .map_err(|e| OutputError::InvalidSink(e.to_string()))
            .and_then(|spec| {
                spec.write(report, output)?;
                tracing::debug!("Report written to {} ({:?})", spec.destination, spec.format);
                Ok(())
            });

        if let Err(error) = result {
            failures.push(SinkFailure {
                sink: identifier.clone(),
                error,
            });
        }
    }

    failures
}
