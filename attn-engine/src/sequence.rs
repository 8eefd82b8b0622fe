use attn_core::{Cue, CueLabel};
use rand::Rng;

use crate::config::SessionConfig;

/// Last chosen label and how many times in a row it has been chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceState<L> {
    pub last_label: Option<L>,
    pub run_length: u32,
}

impl<L> Default for SequenceState<L> {
    fn default() -> Self {
        Self {
            last_label: None,
            run_length: 0,
        }
    }
}

/// Draws cue labels with an anti-streak correction.
///
/// A draw that would extend a run past `max_run_length` is flipped to the other
/// label. With two labels the flip always satisfies the constraint, so there is
/// no retry loop.
#[derive(Debug, Clone)]
pub struct SequenceGenerator<L: Cue> {
    primary: L,
    p_primary: f64,
    max_run_length: Option<u32>,
    state: SequenceState<L>,
}

impl<L: Cue> SequenceGenerator<L> {
    pub fn new(primary: L, p_primary: f64, max_run_length: Option<u32>) -> Self {
        Self {
            primary,
            p_primary,
            max_run_length,
            state: SequenceState::default(),
        }
    }

    pub fn next_label<R: Rng>(&mut self, rng: &mut R) -> L {
        let drawn = if rng.random_bool(self.p_primary) {
            self.primary
        } else {
            self.primary.opposite()
        };
        self.next_from_draw(drawn)
    }

    /// Applies the anti-streak rule to an already drawn label and updates the run state.
    pub fn next_from_draw(&mut self, drawn: L) -> L {
        let chosen = match (self.max_run_length, self.state.last_label) {
            (Some(max), Some(last)) if drawn == last && self.state.run_length >= max => {
                drawn.opposite()
            }
            _ => drawn,
        };

        if self.state.last_label == Some(chosen) {
            self.state.run_length += 1;
        } else {
            self.state.last_label = Some(chosen);
            self.state.run_length = 1;
        }
        chosen
    }

    pub fn state(&self) -> SequenceState<L> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SequenceState::default();
    }
}

impl SequenceGenerator<CueLabel> {
    pub fn from_config(config: &SessionConfig) -> Self {
        let max_run = config.avoid_long_runs.then_some(config.max_run_length);
        Self::new(CueLabel::Increase, config.p_primary, max_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fourth_identical_draw_is_flipped() {
        let mut generator = SequenceGenerator::new(CueLabel::Increase, 0.5, Some(3));
        let chosen: Vec<_> = (0..4)
            .map(|_| generator.next_from_draw(CueLabel::Increase))
            .collect();

        assert_eq!(
            chosen,
            vec![
                CueLabel::Increase,
                CueLabel::Increase,
                CueLabel::Increase,
                CueLabel::Decrease
            ]
        );
        assert_eq!(generator.state().run_length, 1);
        assert_eq!(generator.state().last_label, Some(CueLabel::Decrease));
    }

    #[test]
    fn runs_of_exactly_max_length_are_kept() {
        let mut generator = SequenceGenerator::new(CueLabel::Increase, 0.5, Some(3));
        for _ in 0..3 {
            generator.next_from_draw(CueLabel::Decrease);
        }
        assert_eq!(generator.state().run_length, 3);
        assert_eq!(generator.next_from_draw(CueLabel::Increase), CueLabel::Increase);
    }

    #[test]
    fn disabled_constraint_allows_long_runs() {
        let mut generator = SequenceGenerator::new(CueLabel::Increase, 1.0, None);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(generator.next_label(&mut rng), CueLabel::Increase);
        }
        assert_eq!(generator.state().run_length, 10);
    }

    #[test]
    fn certain_primary_alternates_in_runs_of_max_length() {
        let mut generator = SequenceGenerator::new(CueLabel::Increase, 1.0, Some(3));
        let mut rng = StdRng::seed_from_u64(11);
        let labels: Vec<_> = (0..8).map(|_| generator.next_label(&mut rng)).collect();

        use CueLabel::{Decrease as D, Increase as I};
        assert_eq!(labels, vec![I, I, I, D, I, I, I, D]);
    }

    #[test]
    fn seeded_sequences_never_exceed_max_run() {
        for seed in 0..50 {
            let mut generator = SequenceGenerator::new(CueLabel::Increase, 0.5, Some(3));
            let mut rng = StdRng::seed_from_u64(seed);
            let labels: Vec<_> = (0..400).map(|_| generator.next_label(&mut rng)).collect();

            let longest = labels
                .chunk_by(|a, b| a == b)
                .map(|run| run.len())
                .max()
                .unwrap_or(0);
            assert!(longest <= 3, "seed {seed} produced a run of {longest}");
        }
    }

    #[test]
    fn reset_forgets_previous_run() {
        let mut generator = SequenceGenerator::new(CueLabel::Increase, 0.5, Some(3));
        generator.next_from_draw(CueLabel::Increase);
        generator.reset();
        assert_eq!(generator.state(), SequenceState::default());
    }
}
