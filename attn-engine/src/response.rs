use attn_core::{Choice, TrialRecord};

use crate::trial::Trial;

/// Why a response was not recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotRunning,
    /// Within the debounce window of the previous accepted response.
    Debounced,
    /// Nothing live to answer: the trial was already answered or omitted.
    NoLiveTrial,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Accepted(TrialRecord),
    Ignored(IgnoreReason),
}

impl ResponseOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ResponseOutcome::Accepted(_))
    }
}

/// Debounces responses and resolves the live trial.
///
/// The debounce window is global: it spans trial boundaries and only restarts
/// on an accepted response.
#[derive(Debug, Clone)]
pub struct ResponseGate {
    min_inter_tap_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl ResponseGate {
    pub fn new(min_inter_tap_ms: u64) -> Self {
        Self {
            min_inter_tap_ms,
            last_accepted_ms: None,
        }
    }

    /// Resolves `live` as responded and takes it out of the slot on success.
    pub fn admit(
        &mut self,
        running: bool,
        live: &mut Option<Trial>,
        choice: Choice,
        at_ms: u64,
        origin_ms: u64,
    ) -> ResponseOutcome {
        if !running {
            return ResponseOutcome::Ignored(IgnoreReason::NotRunning);
        }
        if let Some(last) = self.last_accepted_ms {
            if at_ms.saturating_sub(last) < self.min_inter_tap_ms {
                return ResponseOutcome::Ignored(IgnoreReason::Debounced);
            }
        }
        let Some(mut trial) = live.take_if(|t| t.is_unresolved()) else {
            return ResponseOutcome::Ignored(IgnoreReason::NoLiveTrial);
        };

        trial.respond(choice, at_ms.saturating_sub(origin_ms));
        self.last_accepted_ms = Some(at_ms);
        match trial.to_record() {
            Some(record) => ResponseOutcome::Accepted(record),
            None => ResponseOutcome::Ignored(IgnoreReason::NoLiveTrial),
        }
    }

    pub fn last_accepted_ms(&self) -> Option<u64> {
        self.last_accepted_ms
    }

    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attn_core::{CueLabel, DistractorTag};

    fn live(index: usize, at: u64) -> Option<Trial> {
        Some(Trial::new(index, CueLabel::Increase, at, DistractorTag::Baseline))
    }

    #[test]
    fn accepts_first_response_and_empties_slot() {
        let mut gate = ResponseGate::new(120);
        let mut slot = live(0, 0);

        let outcome = gate.admit(true, &mut slot, Choice::Plus, 1_250, 1_000);
        let ResponseOutcome::Accepted(record) = outcome else {
            panic!("response should be accepted");
        };
        assert_eq!(record.reaction_time_ms, Some(250));
        assert_eq!(record.is_correct, Some(true));
        assert!(slot.is_none());
        assert_eq!(gate.last_accepted_ms(), Some(1_250));
    }

    #[test]
    fn ignores_when_not_running() {
        let mut gate = ResponseGate::new(120);
        let mut slot = live(0, 0);
        assert_eq!(
            gate.admit(false, &mut slot, Choice::Plus, 10, 0),
            ResponseOutcome::Ignored(IgnoreReason::NotRunning)
        );
        assert!(slot.is_some());
    }

    #[test]
    fn debounce_spans_trials() {
        let mut gate = ResponseGate::new(120);
        let mut slot = live(0, 0);
        assert!(gate.admit(true, &mut slot, Choice::Plus, 300, 0).is_accepted());

        slot = live(1, 350);
        assert_eq!(
            gate.admit(true, &mut slot, Choice::Plus, 400, 0),
            ResponseOutcome::Ignored(IgnoreReason::Debounced)
        );
        assert!(slot.is_some());
        assert!(gate.admit(true, &mut slot, Choice::Minus, 420, 0).is_accepted());
    }

    #[test]
    fn late_response_without_live_trial_is_ignored() {
        let mut gate = ResponseGate::new(120);
        let mut slot = None;
        assert_eq!(
            gate.admit(true, &mut slot, Choice::Minus, 5_000, 0),
            ResponseOutcome::Ignored(IgnoreReason::NoLiveTrial)
        );
        assert_eq!(gate.last_accepted_ms(), None);
    }
}
