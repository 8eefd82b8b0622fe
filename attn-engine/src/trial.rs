use attn_core::{Choice, Cue, CueLabel, DistractorTag, Resolution, TrialRecord};

/// A presented cue awaiting its single resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub index: usize,
    pub label: CueLabel,
    pub expected_response: Choice,
    pub presented_at_rel_ms: u64,
    pub distractor_tag: DistractorTag,
    resolution: Resolution,
}

impl Trial {
    pub fn new(
        index: usize,
        label: CueLabel,
        presented_at_rel_ms: u64,
        distractor_tag: DistractorTag,
    ) -> Self {
        Self {
            index,
            label,
            expected_response: label.expected_response(),
            presented_at_rel_ms,
            distractor_tag,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn is_unresolved(&self) -> bool {
        self.resolution.is_unresolved()
    }

    /// Marks the trial answered. Returns `false` if it was already resolved.
    pub fn respond(&mut self, choice: Choice, responded_at_rel_ms: u64) -> bool {
        if !self.is_unresolved() {
            return false;
        }
        self.resolution = Resolution::Responded {
            choice,
            responded_at_rel_ms,
        };
        true
    }

    /// Marks the trial as an omission. Returns `false` if it was already resolved.
    pub fn omit(&mut self) -> bool {
        if !self.is_unresolved() {
            return false;
        }
        self.resolution = Resolution::Omitted;
        true
    }

    /// Snapshot for the recorder; `None` while the trial is still live.
    pub fn to_record(&self) -> Option<TrialRecord> {
        let (choice, is_correct, reaction_time_ms, omission) = match self.resolution {
            Resolution::Unresolved => return None,
            Resolution::Responded {
                choice,
                responded_at_rel_ms,
            } => (
                Some(choice),
                Some(choice == self.expected_response),
                Some(responded_at_rel_ms.saturating_sub(self.presented_at_rel_ms)),
                false,
            ),
            Resolution::Omitted => (None, None, None, true),
        };

        Some(TrialRecord {
            trial_index: self.index,
            cue_label: self.label,
            expected_response: self.expected_response,
            choice,
            is_correct,
            reaction_time_ms,
            presented_at_rel_ms: self.presented_at_rel_ms,
            minute_bin: TrialRecord::minute_bin_for(self.presented_at_rel_ms),
            distractor_tag: self.distractor_tag.clone(),
            omission,
        })
    }
}
