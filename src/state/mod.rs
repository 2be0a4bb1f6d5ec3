//! State module for tracking crawl progress
//!
//! A crawl run moves through `Idle → Running → {Completed, Aborted}`. An
//! invalid base URL aborts straight from `Idle`.

mod crawl_state;

pub use crawl_state::CrawlState;
