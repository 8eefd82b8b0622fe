use attn_core::TrialRecord;
use log::error;
use serde::Serialize;

/// Counts over a session's records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub presented: usize,
    pub responded: usize,
    pub omitted: usize,
    pub correct: usize,
    pub post_distractor: usize,
}

/// Append-only store of finalized trials, in presentation order
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    records: Vec<TrialRecord>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one finalized trial. Records whose index does not follow the last
    /// one are refused so the dataset never holds duplicates.
    pub fn append(&mut self, record: TrialRecord) -> bool {
        if let Some(last) = self.records.last() {
            if record.trial_index <= last.trial_index {
                error!(
                    "refusing out-of-order record {} after {}",
                    record.trial_index, last.trial_index
                );
                return false;
            }
        }
        self.records.push(record);
        true
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn summary(&self) -> SessionSummary {
        self.records
            .iter()
            .fold(SessionSummary::default(), |mut acc, r| {
                acc.presented += 1;
                if r.omission {
                    acc.omitted += 1;
                } else {
                    acc.responded += 1;
                }
                if r.is_correct == Some(true) {
                    acc.correct += 1;
                }
                if !r.distractor_tag.is_baseline() {
                    acc.post_distractor += 1;
                }
                acc
            })
    }

    pub fn into_records(self) -> Vec<TrialRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::Trial;
    use attn_core::{Choice, CueLabel, DistractorTag};

    fn omitted(index: usize) -> TrialRecord {
        let mut trial = Trial::new(index, CueLabel::Increase, index as u64 * 3000, DistractorTag::Baseline);
        trial.omit();
        trial.to_record().unwrap()
    }

    #[test]
    fn refuses_duplicates_and_regressions() {
        let mut recorder = SessionRecorder::new();
        assert!(recorder.append(omitted(0)));
        assert!(recorder.append(omitted(1)));
        assert!(!recorder.append(omitted(1)));
        assert!(!recorder.append(omitted(0)));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut recorder = SessionRecorder::new();
        let mut answered = Trial::new(0, CueLabel::Decrease, 0, DistractorTag::Baseline);
        answered.respond(Choice::Minus, 400);
        recorder.append(answered.to_record().unwrap());
        recorder.append(omitted(1));

        assert_eq!(
            recorder.summary(),
            SessionSummary {
                presented: 2,
                responded: 1,
                omitted: 1,
                correct: 1,
                post_distractor: 0,
            }
        );
    }
}
