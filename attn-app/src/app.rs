use anyhow::{Context, Result};
use attn_core::{Choice, TrialRecord};
use attn_engine::{AttentionSession, ResponseOutcome, SessionConfig};
use attn_timing::MonotonicClock;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{Instant, sleep_until};

use crate::presenter::{TerminalPresenter, TerminalVoice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Response(Choice),
    Quit,
    Unknown(String),
}

/// Interprets one line typed by the participant. Blank lines mean nothing.
pub fn parse_input(line: &str) -> Option<Input> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if matches!(trimmed, "q" | "quit" | "stop") {
        return Some(Input::Quit);
    }
    Some(match trimmed.parse::<Choice>() {
        Ok(choice) => Input::Response(choice),
        Err(_) => Input::Unknown(trimmed.to_string()),
    })
}

pub struct App {
    session: AttentionSession<MonotonicClock, StdRng>,
    clock: MonotonicClock,
}

impl App {
    pub fn new(config: SessionConfig, audio: bool) -> Self {
        let clock = MonotonicClock::new();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let session = AttentionSession::new(config, clock.clone(), rng)
            .with_presenter(TerminalPresenter::stdout())
            .with_voice(TerminalVoice::new(audio));

        Self { session, clock }
    }

    /// Runs one session on the terminal and returns its records.
    pub async fn run(mut self) -> Result<Vec<TrialRecord>> {
        let input = spawn_stdin_reader()?;

        println!("=== ATTENTION CUE TASK ===");
        println!(
            "Session length: {} min. Type + or - and press Enter for each cue, q to stop.",
            self.session_minutes()
        );

        self.session.start().context("starting session")?;
        self.drive(input, tokio::signal::ctrl_c()).await;

        Ok(self.session.records().to_vec())
    }

    /// Sleeps until the next timer deadline, the next input line or the
    /// interrupt, whichever comes first, until the session stops.
    ///
    /// `interrupt` is polled across iterations, so a signal listener is
    /// registered once and never dropped between wake-ups.
    async fn drive(&mut self, mut input: UnboundedReceiver<String>, interrupt: impl Future) {
        tokio::pin!(interrupt);
        let mut input_open = true;
        let mut interrupted = false;

        while self.session.is_running() {
            let Some(deadline) = self.session.next_deadline() else {
                break;
            };
            let wake = Instant::from_std(self.clock.instant_at(deadline));

            tokio::select! {
                _ = sleep_until(wake) => {
                    self.session.advance();
                }
                line = input.recv(), if input_open => match line {
                    Some(line) => self.handle_line(&line),
                    None => {
                        debug!("stdin closed; session continues until its end");
                        input_open = false;
                    }
                },
                _ = &mut interrupt, if !interrupted => {
                    info!("interrupted");
                    interrupted = true;
                    self.session.stop();
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        match parse_input(line) {
            Some(Input::Response(choice)) => {
                if let ResponseOutcome::Ignored(reason) = self.session.handle_response(choice) {
                    debug!("input {choice} not counted: {reason:?}");
                }
            }
            Some(Input::Quit) => self.session.stop(),
            Some(Input::Unknown(text)) => warn!("unrecognised input {text:?}; use + or -, q to stop"),
            None => {}
        }
    }

    fn session_minutes(&self) -> f64 {
        self.session.active_config().duration_ms as f64 / 60_000.0
    }
}

/// Reads stdin on its own thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> Result<UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn started_app() -> App {
        let config = SessionConfig {
            duration_ms: 60_000,
            seed: Some(1),
            ..SessionConfig::default()
        };
        let mut app = App::new(config, false);
        app.session.start().unwrap();
        app
    }

    #[tokio::test]
    async fn interrupt_stops_the_session() {
        let mut app = started_app();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("+".to_string()).unwrap();

        app.drive(rx, tokio::time::sleep(Duration::from_millis(300))).await;

        assert!(!app.session.is_running());
        let records = app.session.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].choice, Some(Choice::Plus));
        drop(tx);
    }

    #[tokio::test]
    async fn quit_line_ends_the_loop() {
        let mut app = started_app();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send("q".to_string()).unwrap();

        app.drive(rx, std::future::pending::<()>()).await;

        assert!(!app.session.is_running());
        assert!(app.session.records()[0].omission);
    }

    #[test]
    fn parses_responses_and_commands() {
        assert_eq!(parse_input(" + "), Some(Input::Response(Choice::Plus)));
        assert_eq!(parse_input("minus"), Some(Input::Response(Choice::Minus)));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("   "), None);
        assert_eq!(parse_input("x"), Some(Input::Unknown("x".to_string())));
    }
}
