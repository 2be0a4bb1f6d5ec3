//! Filter expressions
//!
//! One comma-separated list of expressions drives two decisions:
//!
//! | Token | Scope | Output |
//! |-------|-------|--------|
//! | `-pattern` / `!pattern` | URL containing `pattern` is out of scope | result excluded |
//! | `+prefix` | URL starting with `prefix` is in scope on any host | - |
//! | `status:<class>` | - | result kept only if it matches some status filter |
//! | `pattern` | - | result kept only if its URL contains some bare pattern |
//!
//! Status classes: `1xx`..`5xx`, an exact code such as `404`, `ok`, `redirect`,
//! `broken`, `error`, `skipped`.

use crate::report::{CrawlOutcome, CrawlResult};
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A single parsed filter expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    /// Excludes URLs containing the pattern, from both crawl and output
    Exclude(String),
    /// Admits URLs starting with the prefix into scope regardless of host
    Include(String),
    /// Keeps only results whose URL contains the pattern
    Contains(String),
    /// Keeps only results in the given status class
    Status(StatusClass),
}

/// Outcome classes addressable by `status:` filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// `1xx`..`5xx`, stored as the hundreds digit
    Hundreds(u16),
    /// An exact status code
    Code(u16),
    /// Any 2xx response
    Ok,
    /// Any 3xx response
    Redirect,
    /// Non-2xx responses, network errors and timeouts
    Broken,
    /// Network errors and timeouts
    Error,
    /// URLs that were never fetched
    Skipped,
}

impl StatusClass {
    /// Returns true if the outcome belongs to this class
    pub fn matches(&self, outcome: &CrawlOutcome) -> bool {
        match self {
            Self::Hundreds(h) => outcome.status_code().is_some_and(|code| code / 100 == *h),
            Self::Code(c) => outcome.status_code() == Some(*c),
            Self::Ok => outcome.status_code().is_some_and(|code| (200..300).contains(&code)),
            Self::Redirect => outcome.status_code().is_some_and(|code| (300..400).contains(&code)),
            Self::Broken => outcome.is_problem(),
            Self::Error => outcome.is_error(),
            Self::Skipped => outcome.is_skipped(),
        }
    }
}

impl FromStr for StatusClass {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "ok" | "success" => return Ok(Self::Ok),
            "redirect" => return Ok(Self::Redirect),
            "broken" | "failures" => return Ok(Self::Broken),
            "error" | "errors" => return Ok(Self::Error),
            "skipped" => return Ok(Self::Skipped),
            _ => {}
        }

        if let Some(digit) = lowered.strip_suffix("xx") {
            if let Ok(h @ 1..=5) = digit.parse::<u16>() {
                return Ok(Self::Hundreds(h));
            }
        }

        match lowered.parse::<u16>() {
            Ok(code @ 100..=599) => Ok(Self::Code(code)),
            _ => Err(ConfigError::InvalidFilter(format!(
                "unknown status class '{}'",
                s
            ))),
        }
    }
}

impl FromStr for FilterExpr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();

        let (expr, rest) = if let Some(rest) = token.strip_prefix("status:") {
            return rest.parse().map(FilterExpr::Status);
        } else if let Some(rest) = token.strip_prefix('-').or_else(|| token.strip_prefix('!')) {
            (FilterExpr::Exclude(rest.to_string()), rest)
        } else if let Some(rest) = token.strip_prefix('+') {
            (FilterExpr::Include(rest.to_string()), rest)
        } else {
            (FilterExpr::Contains(token.to_string()), token)
        };

        if rest.is_empty() {
            return Err(ConfigError::InvalidFilter(format!(
                "empty pattern in '{}'",
                s
            )));
        }

        Ok(expr)
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclude(p) => write!(f, "-{}", p),
            Self::Include(p) => write!(f, "+{}", p),
            Self::Contains(p) => write!(f, "{}", p),
            Self::Status(class) => match class {
                StatusClass::Hundreds(h) => write!(f, "status:{}xx", h),
                StatusClass::Code(c) => write!(f, "status:{}", c),
                StatusClass::Ok => write!(f, "status:ok"),
                StatusClass::Redirect => write!(f, "status:redirect"),
                StatusClass::Broken => write!(f, "status:broken"),
                StatusClass::Error => write!(f, "status:error"),
                StatusClass::Skipped => write!(f, "status:skipped"),
            },
        }
    }
}

/// An ordered, deduplicated set of filter expressions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    expressions: Vec<FilterExpr>,
}

impl FilterSet {
    /// Parses each expression; the first invalid one fails the whole set
    pub fn parse<I, S>(expressions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in expressions {
            let expr: FilterExpr = raw.as_ref().parse()?;
            if !set.expressions.contains(&expr) {
                set.expressions.push(expr);
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterExpr> {
        self.expressions.iter()
    }

    /// Returns true if any exclusion pattern occurs in the URL
    pub fn excludes(&self, url: &str) -> bool {
        self.expressions.iter().any(|expr| match expr {
            FilterExpr::Exclude(pattern) => url.contains(pattern.as_str()),
            _ => false,
        })
    }

    /// Returns true if an inclusion prefix admits the URL
    pub fn includes(&self, url: &str) -> bool {
        self.expressions.iter().any(|expr| match expr {
            FilterExpr::Include(prefix) => url.starts_with(prefix.as_str()),
            _ => false,
        })
    }

    /// Decides whether a result is written to the output sinks
    pub fn selects(&self, result: &CrawlResult) -> bool {
        if self.excludes(&result.url) {
            return false;
        }

        let mut contains = self
            .expressions
            .iter()
            .filter_map(|expr| match expr {
                FilterExpr::Contains(p) => Some(p),
                _ => None,
            })
            .peekable();
        if contains.peek().is_some() && !contains.any(|p| result.url.contains(p.as_str())) {
            return false;
        }

        let mut statuses = self
            .expressions
            .iter()
            .filter_map(|expr| match expr {
                FilterExpr::Status(class) => Some(class),
                _ => None,
            })
            .peekable();
        if statuses.peek().is_some() && !statuses.any(|class| class.matches(&result.outcome)) {
            return false;
        }

        true
    }

    /// Renders the set back into its comma-separated form
    pub fn to_expression_string(&self) -> String {
        self.expressions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
