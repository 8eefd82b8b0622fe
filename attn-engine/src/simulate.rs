//! Virtual-time sessions with a synthetic participant.
//!
//! Produces datasets with the same shape as a live run without waiting for
//! wall-clock time, which is handy for exercising analysis pipelines.

use attn_core::{Choice, Cue, TrialRecord};
use attn_timing::{Clock, ManualClock};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SessionConfig};
use crate::state::AttentionSession;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticParticipant {
    /// Probability of answering a cue at all.
    pub response_probability: f64,
    /// Probability that an answer uses the wrong key.
    pub error_rate: f64,
    pub min_rt_ms: u64,
    pub max_rt_ms: u64,
}

impl Default for SyntheticParticipant {
    fn default() -> Self {
        Self {
            response_probability: 0.9,
            error_rate: 0.05,
            min_rt_ms: 250,
            max_rt_ms: 900,
        }
    }
}

impl SyntheticParticipant {
    /// Plans the answer to a cue with `expected` as its correct key, as an
    /// absolute clock reading and the key pressed.
    pub fn plan<R: Rng>(
        &self,
        expected: Choice,
        presented_at_ms: u64,
        rng: &mut R,
    ) -> Option<(u64, Choice)> {
        if !rng.random_bool(self.response_probability.clamp(0.0, 1.0)) {
            return None;
        }
        let (lo, hi) = if self.min_rt_ms <= self.max_rt_ms {
            (self.min_rt_ms, self.max_rt_ms)
        } else {
            (self.max_rt_ms, self.min_rt_ms)
        };
        let rt = rng.random_range(lo..=hi);
        let choice = if rng.random_bool(self.error_rate.clamp(0.0, 1.0)) {
            expected.opposite()
        } else {
            expected
        };
        Some((presented_at_ms.saturating_add(rt), choice))
    }
}

/// Runs one complete session in virtual time and returns its records.
///
/// The session RNG is seeded from `config.seed` (0 when unset); the participant
/// draws from an independent stream so changing its behaviour does not perturb
/// the cue sequence.
pub fn run_virtual_session(
    config: SessionConfig,
    participant: &SyntheticParticipant,
) -> Result<Vec<TrialRecord>, ConfigError> {
    let seed = config.seed.unwrap_or(0);
    let clock = ManualClock::new();
    let mut session = AttentionSession::new(config, clock.clone(), StdRng::seed_from_u64(seed));
    let mut participant_rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    session.start()?;
    let mut seen = 0;
    let mut planned: Option<(u64, Choice)> = None;

    loop {
        if session.trials_presented() > seen {
            seen = session.trials_presented();
            planned = session.live_trial().and_then(|trial| {
                let cue = trial.label.expected_response();
                participant.plan(cue, clock.now_ms(), &mut participant_rng)
            });
        }

        match (session.next_deadline(), planned) {
            (deadline, Some((at, choice))) if deadline.is_none_or(|due| at < due) => {
                clock.set(at);
                session.handle_response(choice);
                planned = None;
            }
            (Some(due), _) => {
                clock.set(due);
                session.advance();
            }
            (None, _) => break,
        }
    }

    debug!("virtual session produced {} records", session.records().len());
    Ok(session.records().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistractorConfig;

    fn short_config(seed: u64) -> SessionConfig {
        SessionConfig {
            duration_ms: 120_000,
            seed: Some(seed),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn same_seed_yields_same_dataset() {
        let participant = SyntheticParticipant::default();
        let first = run_virtual_session(short_config(5), &participant).unwrap();
        let second = run_virtual_session(short_config(5), &participant).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn silent_participant_omits_everything() {
        let participant = SyntheticParticipant {
            response_probability: 0.0,
            ..SyntheticParticipant::default()
        };
        let records = run_virtual_session(short_config(2), &participant).unwrap();
        assert!(records.iter().all(|r| r.omission));
    }

    #[test]
    fn perfect_participant_is_always_correct() {
        let participant = SyntheticParticipant {
            response_probability: 1.0,
            error_rate: 0.0,
            min_rt_ms: 300,
            max_rt_ms: 300,
        };
        let config = SessionConfig {
            distractors: DistractorConfig::none(),
            ..short_config(8)
        };
        let records = run_virtual_session(config, &participant).unwrap();

        // the last cue may still be unanswered when the session ends
        let answered: Vec<_> = records.iter().filter(|r| !r.omission).collect();
        assert!(answered.len() + 1 >= records.len());
        assert!(answered.iter().all(|r| r.is_correct == Some(true)));
        assert!(answered.iter().all(|r| r.reaction_time_ms == Some(300)));
    }

    #[test]
    fn invalid_config_is_reported() {
        let config = SessionConfig {
            duration_ms: 0,
            ..SessionConfig::default()
        };
        assert!(run_virtual_session(config, &SyntheticParticipant::default()).is_err());
    }
}
