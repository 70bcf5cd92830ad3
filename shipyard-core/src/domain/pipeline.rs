//! Pipeline state machine
//!
//! A run moves strictly forward through its stages and ends in either
//! `Done` or `Failed`. `Failed` is reachable from every non-terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Start,
    Cloning,
    Inspecting,
    Building,
    Locating,
    Uploading,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether moving from `self` to `next` is a legal transition
    ///
    /// `Inspecting -> Done` is the "nothing to build" stop.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;

        if self.is_terminal() {
            return false;
        }

        matches!(
            (self, next),
            (_, Failed)
                | (Start, Cloning)
                | (Cloning, Inspecting)
                | (Inspecting, Building)
                | (Inspecting, Done)
                | (Building, Locating)
                | (Locating, Uploading)
                | (Uploading, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Cloning => "cloning",
            Self::Inspecting => "inspecting",
            Self::Building => "building",
            Self::Locating => "locating",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
