use std::collections::VecDeque;

use attn_core::{DistractorEvent, DistractorKind, DistractorTag, ToneIntensity};
use log::{debug, warn};
use rand::Rng;

use crate::collaborators::{Presenter, Tone, Voice};
use crate::config::{
    DistractorConfig, DistractorModality, DistractorStrategy, IntensityMode, MailboxPolicy,
};

/// Timer the session must arm for the injector at start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistractorTimer {
    /// Fire once, `offset_ms` after the session origin.
    Once { offset_ms: u64 },
    /// Roll for a distractor every `interval_ms`.
    Every { interval_ms: u64 },
}

/// Maps a percentage setting onto a linear gain in `[0, max_gain]`.
pub fn slider_to_gain(value: u8, max_gain: f32) -> f32 {
    f32::from(value.min(100)) / 100.0 * max_gain
}

/// Draws `count` firing offsets uniformly from
/// `[margin, max(margin + 1000, duration - margin))`.
pub fn draw_offsets<R: Rng>(count: u32, margin_ms: u64, duration_ms: u64, rng: &mut R) -> Vec<u64> {
    let upper = margin_ms
        .saturating_add(1000)
        .max(duration_ms.saturating_sub(margin_ms));
    if upper <= margin_ms {
        return Vec::new();
    }
    (0..count)
        .map(|_| rng.random_range(margin_ms..upper))
        .collect()
}

/// Pending distractor tags not yet attached to a trial
#[derive(Debug, Clone)]
pub struct TagMailbox {
    policy: MailboxPolicy,
    pending: VecDeque<DistractorEvent>,
}

impl TagMailbox {
    pub fn new(policy: MailboxPolicy) -> Self {
        Self {
            policy,
            pending: VecDeque::new(),
        }
    }

    fn capacity(&self) -> usize {
        match self.policy {
            MailboxPolicy::Latest => 1,
            MailboxPolicy::Queue { capacity } => capacity.max(1),
        }
    }

    /// Stores `event`, returning the unconsumed tag it displaced, if any.
    pub fn post(&mut self, event: DistractorEvent) -> Option<DistractorEvent> {
        let displaced = if self.pending.len() >= self.capacity() {
            self.pending.pop_front()
        } else {
            None
        };
        self.pending.push_back(event);
        displaced
    }

    /// Consumes the next tag, or `baseline` when nothing is pending.
    pub fn take(&mut self) -> DistractorTag {
        self.pending.pop_front().into()
    }

    pub fn peek(&self) -> Option<&DistractorEvent> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[derive(Debug, Clone)]
pub struct DistractorInjector {
    config: DistractorConfig,
    mailbox: TagMailbox,
    fired: u32,
    lost: u32,
}

impl DistractorInjector {
    pub fn new(config: DistractorConfig, policy: MailboxPolicy) -> Self {
        Self {
            config,
            mailbox: TagMailbox::new(policy),
            fired: 0,
            lost: 0,
        }
    }

    /// Timers to arm for a session of `duration_ms`.
    pub fn plan<R: Rng>(&self, duration_ms: u64, rng: &mut R) -> Vec<DistractorTimer> {
        match &self.config.strategy {
            DistractorStrategy::Scheduled { count, margin_ms } => {
                draw_offsets(*count, *margin_ms, duration_ms, rng)
                    .into_iter()
                    .map(|offset_ms| DistractorTimer::Once { offset_ms })
                    .collect()
            }
            DistractorStrategy::Explicit { offsets_ms } => offsets_ms
                .iter()
                .map(|&offset_ms| DistractorTimer::Once { offset_ms })
                .collect(),
            DistractorStrategy::Periodic {
                check_interval_ms, ..
            } => vec![DistractorTimer::Every {
                interval_ms: *check_interval_ms,
            }],
        }
    }

    /// Outcome of one periodic roll. Always `false` for pre-scheduled strategies.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> bool {
        match self.config.strategy {
            DistractorStrategy::Periodic { probability, .. } => rng.random_bool(probability),
            _ => false,
        }
    }

    /// Fires one distractor and posts its tag for the next trial.
    ///
    /// Collaborator failures are logged; the event is still recorded as attempted.
    pub fn fire<R: Rng>(
        &mut self,
        offset_rel_ms: u64,
        rng: &mut R,
        presenter: &mut dyn Presenter,
        voice: &mut dyn Voice,
    ) -> DistractorEvent {
        let kind = match self.config.modality {
            DistractorModality::Audio => DistractorKind::Audio,
            DistractorModality::Visual => DistractorKind::Visual,
            DistractorModality::Mixed => {
                if rng.random_bool(0.5) {
                    DistractorKind::Audio
                } else {
                    DistractorKind::Visual
                }
            }
        };

        let event = match kind {
            DistractorKind::Audio => {
                let intensity = self.pick_intensity(rng);
                let tone = Tone {
                    frequency_hz: self.config.tone.frequency_hz,
                    duration_ms: self.config.tone.duration_ms,
                    gain: intensity.gain,
                };
                if let Err(err) = voice.play_tone(&tone) {
                    warn!("distractor tone at {offset_rel_ms} ms not played: {err}");
                }
                DistractorEvent {
                    offset_rel_ms,
                    kind,
                    intensity: Some(intensity),
                }
            }
            DistractorKind::Visual => {
                let event = DistractorEvent {
                    offset_rel_ms,
                    kind,
                    intensity: None,
                };
                presenter.show_distractor_visual(&event);
                event
            }
        };

        self.fired += 1;
        debug!("distractor {:?} fired at {} ms", event.kind, offset_rel_ms);
        if let Some(lost) = self.mailbox.post(event.clone()) {
            self.lost += 1;
            debug!(
                "distractor tag from {} ms overwritten before any trial consumed it",
                lost.offset_rel_ms
            );
        }
        event
    }

    fn pick_intensity<R: Rng>(&self, rng: &mut R) -> ToneIntensity {
        let max_gain = self.config.tone.max_gain;
        match &self.config.intensity {
            IntensityMode::Fixed { value } => ToneIntensity {
                level: "fixed".to_string(),
                raw_value: *value,
                gain: slider_to_gain(*value, max_gain),
            },
            IntensityMode::Random { levels } if !levels.is_empty() => {
                let level = &levels[rng.random_range(0..levels.len())];
                ToneIntensity {
                    level: level.name.clone(),
                    raw_value: level.value,
                    gain: slider_to_gain(level.value, max_gain),
                }
            }
            // rejected by validation; play at zero gain rather than panic
            IntensityMode::Random { .. } => ToneIntensity {
                level: "none".to_string(),
                raw_value: 0,
                gain: 0.0,
            },
        }
    }

    pub fn take_tag(&mut self) -> DistractorTag {
        self.mailbox.take()
    }

    pub fn pending(&self) -> Option<&DistractorEvent> {
        self.mailbox.peek()
    }

    pub fn mailbox(&self) -> &TagMailbox {
        &self.mailbox
    }

    pub fn fired_count(&self) -> u32 {
        self.fired
    }

    /// Tags overwritten or dropped before a trial consumed them.
    pub fn lost_count(&self) -> u32 {
        self.lost
    }

    pub fn reset(&mut self) {
        self.mailbox.clear();
        self.fired = 0;
        self.lost = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, NoopPresenter};
    use crate::config::IntensityLevel;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Default)]
    struct RecordingVoice {
        tones: Vec<Tone>,
        fail: bool,
    }

    impl Voice for RecordingVoice {
        fn play_tone(&mut self, tone: &Tone) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::AudioUnavailable("no device".into()));
            }
            self.tones.push(*tone);
            Ok(())
        }
    }

    fn audio_event(offset_rel_ms: u64) -> DistractorEvent {
        DistractorEvent {
            offset_rel_ms,
            kind: DistractorKind::Audio,
            intensity: None,
        }
    }

    #[test]
    fn gain_is_linear_and_clamped() {
        assert_eq!(slider_to_gain(0, 0.4), 0.0);
        assert!((slider_to_gain(35, 0.4) - 0.14).abs() < 1e-6);
        assert!((slider_to_gain(100, 0.4) - 0.4).abs() < 1e-6);
        assert!((slider_to_gain(250, 0.4) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn offsets_respect_margins() {
        let mut rng = StdRng::seed_from_u64(3);
        let offsets = draw_offsets(200, 5000, 60_000, &mut rng);
        assert_eq!(offsets.len(), 200);
        assert!(offsets.iter().all(|&t| (5000..55_000).contains(&t)));
    }

    #[test]
    fn short_sessions_still_get_a_window() {
        let mut rng = StdRng::seed_from_u64(3);
        let offsets = draw_offsets(20, 5000, 4000, &mut rng);
        assert!(offsets.iter().all(|&t| (5000..6000).contains(&t)));
    }

    #[test]
    fn extreme_margins_do_not_overflow() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(draw_offsets(3, u64::MAX, 60_000, &mut rng).is_empty());
        let near_max = draw_offsets(3, u64::MAX - 10, 60_000, &mut rng);
        assert!(near_max.iter().all(|&t| t >= u64::MAX - 10));
    }

    #[test]
    fn latest_mailbox_keeps_only_newest_tag() {
        let mut mailbox = TagMailbox::new(MailboxPolicy::Latest);
        assert!(mailbox.post(audio_event(500)).is_none());
        let displaced = mailbox.post(audio_event(900));

        assert_eq!(displaced.map(|e| e.offset_rel_ms), Some(500));
        assert_eq!(mailbox.len(), 1);
        assert_eq!(mailbox.take().event().map(|e| e.offset_rel_ms), Some(900));
        assert!(mailbox.take().is_baseline());
    }

    #[test]
    fn queue_mailbox_drains_in_fifo_order() {
        let mut mailbox = TagMailbox::new(MailboxPolicy::Queue { capacity: 2 });
        mailbox.post(audio_event(100));
        mailbox.post(audio_event(200));
        let dropped = mailbox.post(audio_event(300));

        assert_eq!(dropped.map(|e| e.offset_rel_ms), Some(100));
        assert_eq!(mailbox.take().event().map(|e| e.offset_rel_ms), Some(200));
        assert_eq!(mailbox.take().event().map(|e| e.offset_rel_ms), Some(300));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn fixed_intensity_tone_is_played_and_tagged() {
        let mut injector =
            DistractorInjector::new(DistractorConfig::default(), MailboxPolicy::Latest);
        let mut voice = RecordingVoice::default();
        let mut rng = StdRng::seed_from_u64(1);

        let event = injector.fire(7_000, &mut rng, &mut NoopPresenter, &mut voice);

        assert_eq!(voice.tones.len(), 1);
        assert_eq!(voice.tones[0].frequency_hz, 880.0);
        assert_eq!(voice.tones[0].duration_ms, 180);
        let intensity = event.intensity.as_ref().unwrap();
        assert_eq!(intensity.level, "fixed");
        assert_eq!(intensity.raw_value, 35);
        assert_eq!(injector.pending(), Some(&event));
    }

    #[test]
    fn random_intensity_draws_from_configured_levels() {
        let config = DistractorConfig {
            intensity: IntensityMode::three_levels(),
            ..DistractorConfig::default()
        };
        let mut injector = DistractorInjector::new(config, MailboxPolicy::Latest);
        let mut rng = StdRng::seed_from_u64(9);

        for i in 0..30 {
            let event = injector.fire(i, &mut rng, &mut NoopPresenter, &mut RecordingVoice::default());
            let intensity = event.intensity.unwrap();
            let expected = match intensity.level.as_str() {
                "low" => 20,
                "mid" => 35,
                "high" => 55,
                other => panic!("unexpected level {other}"),
            };
            assert_eq!(intensity.raw_value, expected);
        }
        assert_eq!(injector.fired_count(), 30);
        assert_eq!(injector.lost_count(), 29);
    }

    #[test]
    fn failed_tone_is_still_tagged() {
        let mut injector =
            DistractorInjector::new(DistractorConfig::default(), MailboxPolicy::Latest);
        let mut voice = RecordingVoice {
            fail: true,
            ..RecordingVoice::default()
        };
        let mut rng = StdRng::seed_from_u64(1);

        injector.fire(6_000, &mut rng, &mut NoopPresenter, &mut voice);
        assert_eq!(injector.take_tag().label(), "post_beep");
    }

    #[test]
    fn explicit_plan_is_used_verbatim() {
        let config = DistractorConfig {
            strategy: DistractorStrategy::Explicit {
                offsets_ms: vec![500, 12_000],
            },
            ..DistractorConfig::default()
        };
        let injector = DistractorInjector::new(config, MailboxPolicy::Latest);
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(
            injector.plan(60_000, &mut rng),
            vec![
                DistractorTimer::Once { offset_ms: 500 },
                DistractorTimer::Once { offset_ms: 12_000 }
            ]
        );
    }

    #[test]
    fn periodic_rolls_follow_probability() {
        let certain = DistractorConfig {
            strategy: DistractorStrategy::Periodic {
                check_interval_ms: 12_000,
                probability: 1.0,
            },
            ..DistractorConfig::default()
        };
        let injector = DistractorInjector::new(certain, MailboxPolicy::Latest);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(injector.roll(&mut rng));
        assert_eq!(
            injector.plan(60_000, &mut rng),
            vec![DistractorTimer::Every { interval_ms: 12_000 }]
        );

        let scheduled = DistractorInjector::new(DistractorConfig::default(), MailboxPolicy::Latest);
        assert!(!scheduled.roll(&mut rng));
    }
}
