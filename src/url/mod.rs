//! URL handling module
//!
//! This module provides URL normalization and the scope filter that decides
//! which discovered links the crawler may follow.

mod normalize;
mod scope;

// Re-export main functions
pub use normalize::normalize_url;
pub use scope::{extract_host, Scope};
