use serde::{Deserialize, Serialize};

use crate::cue::{Choice, CueLabel};
use crate::distractor::DistractorTag;

/// Trial resolution; leaves `Unresolved` exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Unresolved,
    Responded {
        choice: Choice,
        responded_at_rel_ms: u64,
    },
    Omitted,
}

impl Resolution {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }
}

/// Finalized trial, one row of the exported dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub trial_index: usize,
    pub cue_label: CueLabel,
    pub expected_response: Choice,
    pub choice: Option<Choice>,
    pub is_correct: Option<bool>,
    pub reaction_time_ms: Option<u64>,
    pub presented_at_rel_ms: u64,
    pub minute_bin: u64,
    pub distractor_tag: DistractorTag,
    pub omission: bool,
}

impl TrialRecord {
    pub fn minute_bin_for(presented_at_rel_ms: u64) -> u64 {
        presented_at_rel_ms / 60_000
    }
}
