use super::collaborators::{NoopPresenter, Presenter, SilentVoice, Voice};
use super::config::{ConfigError, SessionConfig};
use super::distractor::{DistractorInjector, DistractorTimer};
use super::recorder::{SessionRecorder, SessionSummary};
use super::response::{ResponseGate, ResponseOutcome};
use super::sequence::SequenceGenerator;
use super::trial::Trial;
use attn_core::{Choice, Cue, CueLabel, DistractorEvent, SessionStatus, TrialRecord};
use attn_timing::{Clock, ManualClock, TimerHandle, TimerQueue};
use log::{debug, info, warn};
use rand::Rng;

const CUE_SUBTEXT: &str = "Respond with + / -";

/// Deferred callbacks owned by a running session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    PresentTrial,
    SessionEnd,
    Distractor,
    DistractorCheck { interval_ms: u64 },
    ClearCue,
    ClearAcknowledgement(Choice),
    RefreshDisplay,
}

/// One test administration: trial timeline, distractors, responses and records.
///
/// All state is mutated through `&mut self`, so a single owner serializes timer
/// firings and responses. The owner feeds time in by calling [`advance`] at or
/// after [`next_deadline`], and forwards responses to [`handle_response`].
///
/// [`advance`]: AttentionSession::advance
/// [`next_deadline`]: AttentionSession::next_deadline
/// [`handle_response`]: AttentionSession::handle_response
pub struct AttentionSession<C, R>
where
    C: Clock,
    R: Rng,
{
    clock: C,
    rng: R,
    config: SessionConfig,
    active: SessionConfig,
    status: SessionStatus,
    origin_ms: u64,
    timers: TimerQueue<ScheduledEvent>,
    sequence: SequenceGenerator<CueLabel>,
    injector: DistractorInjector,
    gate: ResponseGate,
    recorder: SessionRecorder,
    live: Option<Trial>,
    trial_count: usize,
    cue_reset: Option<TimerHandle>,
    speech_warned: bool,
    presenter: Box<dyn Presenter>,
    voice: Box<dyn Voice>,
}

impl<C, R> AttentionSession<C, R>
where
    C: Clock,
    R: Rng,
{
    pub fn new(config: SessionConfig, clock: C, rng: R) -> Self {
        let active = config.clone();
        Self {
            clock,
            rng,
            sequence: SequenceGenerator::from_config(&active),
            injector: DistractorInjector::new(active.distractors.clone(), active.mailbox),
            gate: ResponseGate::new(active.min_inter_tap_ms),
            config,
            active,
            status: SessionStatus::Idle,
            origin_ms: 0,
            timers: TimerQueue::new(),
            recorder: SessionRecorder::new(),
            live: None,
            trial_count: 0,
            cue_reset: None,
            speech_warned: false,
            presenter: Box::new(NoopPresenter),
            voice: Box::new(SilentVoice),
        }
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn with_voice(mut self, voice: impl Voice + 'static) -> Self {
        self.voice = Box::new(voice);
        self
    }

    /// Replaces the configuration used by the next `start()`. A running session
    /// keeps the configuration it started with.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    /// Starts a fresh session. Invalid configuration is rejected before anything
    /// changes; calling this while running is a no-op.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        if !self.status.can_start() {
            debug!("start ignored: session already running");
            return Ok(());
        }
        self.config.validate()?;

        self.clear_session();
        self.active = self.config.clone();
        self.sequence = SequenceGenerator::from_config(&self.active);
        self.injector =
            DistractorInjector::new(self.active.distractors.clone(), self.active.mailbox);
        self.gate = ResponseGate::new(self.active.min_inter_tap_ms);

        self.origin_ms = self.clock.now_ms();
        self.status = SessionStatus::Running;
        info!(
            "session started: {} ms, ISI {}-{} ms",
            self.active.duration_ms, self.active.min_isi_ms, self.active.max_isi_ms
        );

        for timer in self.injector.plan(self.active.duration_ms, &mut self.rng) {
            match timer {
                DistractorTimer::Once { offset_ms } => {
                    self.timers
                        .schedule_after(self.origin_ms, offset_ms, ScheduledEvent::Distractor);
                }
                DistractorTimer::Every { interval_ms } => {
                    self.timers.schedule_after(
                        self.origin_ms,
                        interval_ms,
                        ScheduledEvent::DistractorCheck { interval_ms },
                    );
                }
            }
        }

        self.presenter.update_elapsed(0);
        self.present_trial();
        self.schedule_next_trial();
        if self.status.is_running() {
            self.timers.schedule_after(
                self.origin_ms,
                self.active.duration_ms,
                ScheduledEvent::SessionEnd,
            );
            self.schedule_refresh();
        }
        Ok(())
    }

    /// Ends the session, cancelling every pending callback. An unanswered live
    /// trial is recorded as an omission.
    pub fn stop(&mut self) {
        if !self.status.is_running() {
            return;
        }
        self.status = SessionStatus::Stopped;
        let cancelled = self.timers.cancel_all();
        self.cue_reset = None;
        self.finalize_live_as_omitted();

        let summary = self.recorder.summary();
        info!(
            "session stopped at {} ms: {} trials, {} responded, {} omitted ({} callbacks cancelled)",
            self.elapsed_ms(),
            summary.presented,
            summary.responded,
            summary.omitted,
            cancelled
        );
        self.presenter.session_finished(&summary);
    }

    /// Discards everything and returns to `Idle`.
    pub fn reset(&mut self) {
        self.clear_session();
        self.status = SessionStatus::Idle;
        debug!("session reset");
    }

    fn clear_session(&mut self) {
        self.timers.cancel_all();
        self.cue_reset = None;
        self.recorder.clear();
        self.live = None;
        self.trial_count = 0;
        self.sequence.reset();
        self.injector.reset();
        self.gate.reset();
    }

    /// Records a response stamped with the current clock reading.
    pub fn handle_response(&mut self, choice: Choice) -> ResponseOutcome {
        let at_ms = self.clock.now_ms();
        let outcome = self.gate.admit(
            self.status.is_running(),
            &mut self.live,
            choice,
            at_ms,
            self.origin_ms,
        );

        match &outcome {
            ResponseOutcome::Accepted(record) => {
                debug!(
                    "trial {} answered {} after {:?} ms",
                    record.trial_index, choice, record.reaction_time_ms
                );
                self.recorder.append(record.clone());
                self.presenter.acknowledge_response(choice);
                self.timers.schedule_after(
                    at_ms,
                    self.active.ack_flash_ms,
                    ScheduledEvent::ClearAcknowledgement(choice),
                );
            }
            ResponseOutcome::Ignored(reason) => {
                debug!("response {choice} ignored: {reason:?}");
            }
        }
        outcome
    }

    /// Fires every callback due at the current clock reading, in order.
    /// Returns how many fired.
    pub fn advance(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some((_, event)) = self.timers.pop_due(now) {
            fired += 1;
            self.dispatch(event);
        }
        fired
    }

    fn dispatch(&mut self, event: ScheduledEvent) {
        if !self.status.is_running() {
            debug!("stale callback {event:?} ignored");
            return;
        }

        match event {
            ScheduledEvent::PresentTrial => {
                self.present_trial();
                self.schedule_next_trial();
            }
            ScheduledEvent::SessionEnd => self.stop(),
            ScheduledEvent::Distractor => self.fire_distractor(),
            ScheduledEvent::DistractorCheck { interval_ms } => {
                if self.injector.roll(&mut self.rng) {
                    self.fire_distractor();
                }
                let now = self.clock.now_ms();
                self.timers.schedule_after(
                    now,
                    interval_ms,
                    ScheduledEvent::DistractorCheck { interval_ms },
                );
            }
            ScheduledEvent::ClearCue => {
                self.cue_reset = None;
                self.presenter.clear_cue_to_continue();
            }
            ScheduledEvent::ClearAcknowledgement(choice) => {
                self.presenter.clear_acknowledgement(choice)
            }
            ScheduledEvent::RefreshDisplay => {
                self.presenter.update_elapsed(self.elapsed_ms());
                self.schedule_refresh();
            }
        }
    }

    fn present_trial(&mut self) {
        self.finalize_live_as_omitted();

        let label = self.sequence.next_label(&mut self.rng);
        let tag = self.injector.take_tag();
        let now = self.clock.now_ms();
        let trial = Trial::new(self.trial_count, label, now.saturating_sub(self.origin_ms), tag);
        self.trial_count += 1;

        debug!(
            "trial {} {} presented at {} ms ({})",
            trial.index,
            label,
            trial.presented_at_rel_ms,
            trial.distractor_tag.label()
        );
        self.live = Some(trial);

        self.presenter.show_cue(label.display(), CUE_SUBTEXT);
        if let Err(err) = self.voice.speak(label.spoken()) {
            if self.speech_warned {
                debug!("cue not spoken: {err}");
            } else {
                warn!("cue not spoken: {err}");
                self.speech_warned = true;
            }
        }
        if let Some(previous) = self.cue_reset.take() {
            self.timers.cancel(previous);
        }
        self.cue_reset = Some(self.timers.schedule_after(
            now,
            self.active.show_cue_text_ms,
            ScheduledEvent::ClearCue,
        ));
    }

    fn schedule_next_trial(&mut self) {
        if !self.status.is_running() {
            return;
        }
        if self.elapsed_ms() >= self.active.duration_ms {
            self.stop();
            return;
        }
        let isi = self
            .rng
            .random_range(self.active.min_isi_ms..=self.active.max_isi_ms);
        let now = self.clock.now_ms();
        self.timers
            .schedule_after(now, isi, ScheduledEvent::PresentTrial);
    }

    fn schedule_refresh(&mut self) {
        if self.active.refresh_interval_ms == 0 {
            return;
        }
        let now = self.clock.now_ms();
        self.timers.schedule_after(
            now,
            self.active.refresh_interval_ms,
            ScheduledEvent::RefreshDisplay,
        );
    }

    fn fire_distractor(&mut self) {
        let offset = self.elapsed_ms();
        self.injector.fire(
            offset,
            &mut self.rng,
            self.presenter.as_mut(),
            self.voice.as_mut(),
        );
    }

    fn finalize_live_as_omitted(&mut self) {
        let Some(mut trial) = self.live.take() else {
            return;
        };
        if trial.omit() {
            debug!("trial {} omitted", trial.index);
            if let Some(record) = trial.to_record() {
                self.recorder.append(record);
            }
        }
    }

    /// Absolute clock reading of the earliest pending callback.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_callbacks(&self) -> usize {
        self.timers.len()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms(self.origin_ms)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    pub fn records(&self) -> &[TrialRecord] {
        self.recorder.records()
    }

    pub fn live_trial(&self) -> Option<&Trial> {
        self.live.as_ref()
    }

    pub fn pending_distractor(&self) -> Option<&DistractorEvent> {
        self.injector.pending()
    }

    pub fn distractors_fired(&self) -> u32 {
        self.injector.fired_count()
    }

    pub fn trials_presented(&self) -> usize {
        self.trial_count
    }

    pub fn summary(&self) -> SessionSummary {
        self.recorder.summary()
    }

    /// Configuration the current (or last) session runs with.
    pub fn active_config(&self) -> &SessionConfig {
        &self.active
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<R: Rng> AttentionSession<ManualClock, R> {
    /// Fires callbacks in deadline order while moving virtual time forward to
    /// `target_ms`, so each callback observes its own due time.
    pub fn run_until(&mut self, target_ms: u64) {
        while let Some(due) = self.next_deadline() {
            if due > target_ms {
                break;
            }
            self.clock.set(due);
            self.advance();
        }
        self.clock.set(target_ms);
    }
}
