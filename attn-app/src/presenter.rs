use attn_core::{Choice, DistractorEvent};
use attn_engine::{CollaboratorError, Presenter, SessionSummary, Tone, Voice};
use log::warn;
use std::io::{self, Write};

#[cfg(feature = "audio")]
use crate::audio::ToneEngine;

const BELL: &str = "\x07";

/// Formats elapsed session time as `m:ss`.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let secs = elapsed_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Line-oriented display: one line per cue, acknowledgement and distractor.
pub struct TerminalPresenter<W: Write> {
    out: W,
    last_minute: Option<u64>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_minute: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // the display is best effort; a closed stdout must not stop the session
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_cue(&mut self, cue: &str, subtext: &str) {
        self.line(&format!("\n    {cue}    ({subtext})"));
    }

    fn clear_cue_to_continue(&mut self) {
        self.line("    ...");
    }

    fn acknowledge_response(&mut self, choice: Choice) {
        self.line(&format!("    [{choice}] registered"));
    }

    fn show_distractor_visual(&mut self, _event: &DistractorEvent) {
        self.line("    ********");
    }

    fn update_elapsed(&mut self, elapsed_ms: u64) {
        let minute = elapsed_ms / 60_000;
        if self.last_minute != Some(minute) {
            self.last_minute = Some(minute);
            self.line(&format!("-- {} elapsed --", format_elapsed(elapsed_ms)));
        }
    }

    fn session_finished(&mut self, summary: &SessionSummary) {
        self.line(&format!(
            "\nSession finished: {} trials, {} responded ({} correct), {} omitted, {} after a distractor",
            summary.presented,
            summary.responded,
            summary.correct,
            summary.omitted,
            summary.post_distractor
        ));
    }
}

/// Tones go to the audio device when available, otherwise to the terminal bell.
/// There is no speech synthesis in the terminal.
pub struct TerminalVoice {
    #[cfg(feature = "audio")]
    engine: Option<ToneEngine>,
}

impl TerminalVoice {
    pub fn new(audio: bool) -> Self {
        #[cfg(feature = "audio")]
        {
            let engine = if audio {
                match ToneEngine::spawn() {
                    Ok(engine) => Some(engine),
                    Err(e) => {
                        warn!("{e}; falling back to the terminal bell");
                        None
                    }
                }
            } else {
                None
            };
            Self { engine }
        }
        #[cfg(not(feature = "audio"))]
        {
            if audio {
                warn!("built without the `audio` feature; distractor tones use the terminal bell");
            }
            Self {}
        }
    }
}

impl Voice for TerminalVoice {
    fn speak(&mut self, _text: &str) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::SpeechUnavailable(
            "terminal front end has no speech synthesizer".to_string(),
        ))
    }

    fn play_tone(&mut self, tone: &Tone) -> Result<(), CollaboratorError> {
        #[cfg(feature = "audio")]
        if let Some(engine) = &self.engine {
            return engine.play(tone);
        }
        let _ = tone;
        let mut out = io::stdout();
        write!(out, "{BELL}")
            .and_then(|_| out.flush())
            .map_err(|e| CollaboratorError::AudioUnavailable(e.to_string()))
    }
}
