//! Capabilities the engine drives but does not implement.
//!
//! Every method has a no-op default so a front end only overrides what it can
//! actually render or play. None of the return values feed back into trial
//! scheduling; voice failures are logged by the session and otherwise ignored.

use attn_core::{Choice, DistractorEvent};
use thiserror::Error;

use crate::recorder::SessionSummary;

#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),
    #[error("speech synthesis unavailable: {0}")]
    SpeechUnavailable(String),
}

/// A tone to play for an audio distractor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub gain: f32,
}

pub trait Presenter {
    fn show_cue(&mut self, _cue: &str, _subtext: &str) {}
    fn clear_cue_to_continue(&mut self) {}
    /// Neutral "response registered" feedback; correctness is never revealed.
    fn acknowledge_response(&mut self, _choice: Choice) {}
    fn clear_acknowledgement(&mut self, _choice: Choice) {}
    fn show_distractor_visual(&mut self, _event: &DistractorEvent) {}
    fn update_elapsed(&mut self, _elapsed_ms: u64) {}
    fn session_finished(&mut self, _summary: &SessionSummary) {}
}

pub trait Voice {
    fn speak(&mut self, _text: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }

    fn play_tone(&mut self, _tone: &Tone) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl Presenter for NoopPresenter {}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentVoice;

impl Voice for SilentVoice {}
