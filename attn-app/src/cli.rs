use anyhow::{Context, Result, anyhow};
use attn_engine::{
    DEFAULT_PERIODIC_PROBABILITY, DistractorModality, DistractorStrategy, IntensityMode,
    MailboxPolicy, SessionConfig, SyntheticParticipant,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::output::Format;

#[derive(Parser)]
#[command(
    name = "attention-task",
    version,
    about = "Timed PLUS/MINUS cue task with distractor tones"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a live session in this terminal: type + or - then Enter, q to stop
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Play distractor tones on the default output device (needs the `audio` feature)
        #[arg(long)]
        audio: bool,
    },
    /// Run a session in virtual time with a synthetic participant
    Simulate {
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        participant: ParticipantArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModalityArg {
    #[value(name = "audio")]
    Audio,
    #[value(name = "visual")]
    Visual,
    #[value(name = "mixed")]
    Mixed,
}

impl From<ModalityArg> for DistractorModality {
    fn from(value: ModalityArg) -> Self {
        match value {
            ModalityArg::Audio => DistractorModality::Audio,
            ModalityArg::Visual => DistractorModality::Visual,
            ModalityArg::Mixed => DistractorModality::Mixed,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// JSON session settings; the flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Session length in minutes
    #[arg(long)]
    pub minutes: Option<u64>,
    /// Number of distractors scheduled at start
    #[arg(long, conflicts_with = "periodic_secs")]
    pub distractors: Option<u32>,
    /// Roll for a distractor every N seconds instead of scheduling them up front
    #[arg(long)]
    pub periodic_secs: Option<u64>,
    /// Chance that a periodic roll fires
    #[arg(long, default_value_t = DEFAULT_PERIODIC_PROBABILITY)]
    pub periodic_probability: f64,
    #[arg(long, value_enum)]
    pub distractor_kind: Option<ModalityArg>,
    /// Fixed tone loudness on a 0-100 slider
    #[arg(long, conflicts_with = "random_intensity")]
    pub intensity: Option<u8>,
    /// Draw each tone from the low/mid/high levels
    #[arg(long)]
    pub random_intensity: bool,
    /// Keep every unconsumed distractor tag instead of only the latest
    #[arg(long)]
    pub queue_tags: bool,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,
}

impl SessionArgs {
    /// Loads the config file (or defaults) and applies the command-line overrides.
    pub fn load_config(&self) -> Result<SessionConfig> {
        let base = match &self.config {
            Some(path) => SessionConfig::from_json_file(path)
                .with_context(|| format!("loading session config {}", path.display()))?,
            None => SessionConfig::default(),
        };
        let config = self.apply(base)?;
        config.validate().context("invalid session configuration")?;
        Ok(config)
    }

    pub fn apply(&self, mut config: SessionConfig) -> Result<SessionConfig> {
        if let Some(minutes) = self.minutes {
            config.duration_ms = minutes
                .checked_mul(60_000)
                .ok_or_else(|| anyhow!("--minutes {minutes} is too long"))?;
        }
        if let Some(count) = self.distractors {
            let margin_ms = match config.distractors.strategy {
                DistractorStrategy::Scheduled { margin_ms, .. } => margin_ms,
                _ => 5000,
            };
            config.distractors.strategy = DistractorStrategy::Scheduled { count, margin_ms };
        }
        if let Some(secs) = self.periodic_secs {
            config.distractors.strategy = DistractorStrategy::Periodic {
                check_interval_ms: secs
                    .checked_mul(1000)
                    .ok_or_else(|| anyhow!("--periodic-secs {secs} is too long"))?,
                probability: self.periodic_probability,
            };
        }
        if let Some(kind) = self.distractor_kind {
            config.distractors.modality = kind.into();
        }
        if let Some(value) = self.intensity {
            config.distractors.intensity = IntensityMode::Fixed { value };
        }
        if self.random_intensity {
            config.distractors.intensity = IntensityMode::three_levels();
        }
        if self.queue_tags {
            config.mailbox = MailboxPolicy::Queue { capacity: 4 };
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParticipantArgs {
    #[arg(long, default_value_t = 0.9)]
    pub response_probability: f64,
    #[arg(long, default_value_t = 0.05)]
    pub error_rate: f64,
    #[arg(long, default_value_t = 250)]
    pub min_rt_ms: u64,
    #[arg(long, default_value_t = 900)]
    pub max_rt_ms: u64,
}

impl From<&ParticipantArgs> for SyntheticParticipant {
    fn from(args: &ParticipantArgs) -> Self {
        SyntheticParticipant {
            response_probability: args.response_probability,
            error_rate: args.error_rate,
            min_rt_ms: args.min_rt_ms,
            max_rt_ms: args.max_rt_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_args(argv: &[&str]) -> SessionArgs {
        let mut full = vec!["attention-task", "simulate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Simulate { session, .. } => session,
            Commands::Run { .. } => unreachable!(),
        }
    }

    #[test]
    fn no_flags_keeps_defaults() {
        let args = session_args(&[]);
        assert_eq!(args.apply(SessionConfig::default()).unwrap(), SessionConfig::default());
        assert!(matches!(args.format, Format::Csv));
    }

    #[test]
    fn overrides_reach_the_config() {
        let args = session_args(&[
            "--minutes",
            "5",
            "--distractors",
            "2",
            "--random-intensity",
            "--queue-tags",
            "--seed",
            "9",
        ]);
        let config = args.apply(SessionConfig::default()).unwrap();

        assert_eq!(config.duration_ms, 300_000);
        assert_eq!(
            config.distractors.strategy,
            DistractorStrategy::Scheduled {
                count: 2,
                margin_ms: 5000
            }
        );
        assert_eq!(config.distractors.intensity, IntensityMode::three_levels());
        assert_eq!(config.mailbox, MailboxPolicy::Queue { capacity: 4 });
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn periodic_flag_switches_strategy() {
        let args = session_args(&["--periodic-secs", "12", "--periodic-probability", "0.25"]);
        let config = args.apply(SessionConfig::default()).unwrap();
        assert_eq!(
            config.distractors.strategy,
            DistractorStrategy::Periodic {
                check_interval_ms: 12_000,
                probability: 0.25
            }
        );
    }

    #[test]
    fn periodic_probability_defaults_to_reference_rate() {
        let args = session_args(&["--periodic-secs", "12"]);
        let config = args.apply(SessionConfig::default()).unwrap();
        assert_eq!(
            config.distractors.strategy,
            DistractorStrategy::Periodic {
                check_interval_ms: 12_000,
                probability: 0.35
            }
        );
    }

    #[test]
    fn oversized_durations_are_errors() {
        let minutes = u64::MAX.to_string();
        let args = session_args(&["--minutes", minutes.as_str()]);
        assert!(args.apply(SessionConfig::default()).is_err());
        assert!(args.load_config().is_err());

        let args = session_args(&["--periodic-secs", minutes.as_str()]);
        assert!(args.apply(SessionConfig::default()).is_err());
    }

    #[test]
    fn conflicting_strategies_are_rejected() {
        let argv = [
            "attention-task",
            "simulate",
            "--distractors",
            "3",
            "--periodic-secs",
            "10",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn zero_minutes_fails_validation() {
        let args = session_args(&["--minutes", "0"]);
        assert!(args.load_config().is_err());
    }
}
