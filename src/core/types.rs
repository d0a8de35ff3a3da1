use std::time::Duration;

use thiserror::Error;

/// Browser window dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 800,
        }
    }
}

/// Named audio signal associated with one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Move,
    Scroll,
    Click,
    Wait,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Cue::Move => "move",
            Cue::Scroll => "scroll",
            Cue::Click => "click",
            Cue::Wait => "wait",
        }
    }
}

/// One run's parameters, drawn from the candidate pools before the session
/// starts and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub url: String,
    pub action_count: usize,
    /// Base inter-action timeout; slots are spaced `2 * timeout` apart.
    pub timeout: Duration,
}

/// What a finished session reports back to the run loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReport {
    pub dispatched: usize,
}

/// Session failure taxonomy. Nothing here is retried; every variant unwinds
/// through the session runner and stops the run loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser capability call failed: {0}")]
    Capability(String),

    #[error("sequence generation failed: {0}")]
    Generation(String),
}

impl SessionError {
    pub fn capability(err: impl std::fmt::Display) -> Self {
        Self::Capability(err.to_string())
    }
}
