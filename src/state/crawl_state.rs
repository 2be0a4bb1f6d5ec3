/// Crawl run state definitions
use crate::SmokeError;
use serde::Serialize;
use std::fmt;

/// Represents the lifecycle state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    /// Base URL not yet enqueued
    Idle,

    /// Workers are draining the frontier
    Running,

    // ===== Terminal States =====
    /// Frontier drained or count budget exhausted
    Completed,

    /// Run could not start, or was cancelled; partial results are kept
    Aborted,
}

impl CrawlState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if the state machine permits moving to `to`
    pub fn can_transition_to(&self, to: CrawlState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Aborted)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    /// Moves to `to`, or fails with `InvalidTransition`
    pub fn transition(self, to: CrawlState) -> Result<CrawlState, SmokeError> {
        if self.can_transition_to(to) {
            tracing::debug!("Crawl state {} -> {}", self, to);
            Ok(to)
        } else {
            Err(SmokeError::InvalidTransition { from: self, to })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let state = CrawlState::Idle;
        let state = state.transition(CrawlState::Running).unwrap();
        let state = state.transition(CrawlState::Completed).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_abort_before_start() {
        let state = CrawlState::Idle.transition(CrawlState::Aborted).unwrap();
        assert_eq!(state, CrawlState::Aborted);
    }

    #[test]
    fn test_cancel_while_running() {
        let state = CrawlState::Running.transition(CrawlState::Aborted).unwrap();
        assert!(state.is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [CrawlState::Completed, CrawlState::Aborted] {
            for to in [
                CrawlState::Idle,
                CrawlState::Running,
                CrawlState::Completed,
                CrawlState::Aborted,
            ] {
                assert!(matches!(
                    from.transition(to),
                    Err(SmokeError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_cannot_complete_without_running() {
        assert!(CrawlState::Idle.transition(CrawlState::Completed).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlState::Completed.to_string(), "completed");
    }
}
