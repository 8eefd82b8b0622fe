use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("session duration must be greater than zero")]
    ZeroDuration,
    #[error("inter-stimulus interval must be positive")]
    ZeroInterval,
    #[error("minimum ISI ({min} ms) exceeds maximum ISI ({max} ms)")]
    IsiRange { min: u64, max: u64 },
    #[error("{name} must lie within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("maximum run length must be at least 1")]
    ZeroRunLength,
    #[error("random intensity mode needs at least one level")]
    NoIntensityLevels,
    #[error("periodic distractor check interval must be greater than zero")]
    ZeroCheckInterval,
    #[error("distractor mailbox queue needs a capacity of at least 1")]
    ZeroMailboxCapacity,
    #[error("distractor margin of {margin_ms} ms leaves no room in a {duration_ms} ms session")]
    MarginTooWide { margin_ms: u64, duration_ms: u64 },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Session parameters, read once when a session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub duration_ms: u64,
    pub min_isi_ms: u64,
    pub max_isi_ms: u64,
    /// Probability of drawing `PLUS` before the anti-streak correction.
    pub p_primary: f64,
    pub avoid_long_runs: bool,
    pub max_run_length: u32,
    pub show_cue_text_ms: u64,
    pub min_inter_tap_ms: u64,
    pub ack_flash_ms: u64,
    pub refresh_interval_ms: u64,
    pub distractors: DistractorConfig,
    pub mailbox: MailboxPolicy,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 600_000,
            min_isi_ms: 2200,
            max_isi_ms: 4200,
            p_primary: 0.5,
            avoid_long_runs: true,
            max_run_length: 3,
            show_cue_text_ms: 700,
            min_inter_tap_ms: 120,
            ack_flash_ms: 160,
            refresh_interval_ms: 100,
            distractors: DistractorConfig::default(),
            mailbox: MailboxPolicy::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Rejects any configuration whose timeline cannot be scheduled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.min_isi_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.min_isi_ms > self.max_isi_ms {
            return Err(ConfigError::IsiRange {
                min: self.min_isi_ms,
                max: self.max_isi_ms,
            });
        }
        check_probability("p_primary", self.p_primary)?;
        if self.avoid_long_runs && self.max_run_length == 0 {
            return Err(ConfigError::ZeroRunLength);
        }
        if let MailboxPolicy::Queue { capacity: 0 } = self.mailbox {
            return Err(ConfigError::ZeroMailboxCapacity);
        }
        self.distractors.validate(self.duration_ms)
    }

    pub fn with_fixed_isi(mut self, isi_ms: u64) -> Self {
        self.min_isi_ms = isi_ms;
        self.max_isi_ms = isi_ms;
        self
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Probability { name, value })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistractorConfig {
    pub strategy: DistractorStrategy,
    pub modality: DistractorModality,
    pub intensity: IntensityMode,
    pub tone: ToneConfig,
}

impl Default for DistractorConfig {
    fn default() -> Self {
        Self {
            strategy: DistractorStrategy::default(),
            modality: DistractorModality::Audio,
            intensity: IntensityMode::default(),
            tone: ToneConfig::default(),
        }
    }
}

impl DistractorConfig {
    pub fn none() -> Self {
        Self {
            strategy: DistractorStrategy::Scheduled {
                count: 0,
                margin_ms: 5000,
            },
            ..Self::default()
        }
    }

    fn validate(&self, duration_ms: u64) -> Result<(), ConfigError> {
        if let DistractorStrategy::Scheduled { count, margin_ms } = self.strategy {
            if count > 0 && margin_ms >= duration_ms {
                return Err(ConfigError::MarginTooWide {
                    margin_ms,
                    duration_ms,
                });
            }
        }
        if let DistractorStrategy::Periodic {
            check_interval_ms,
            probability,
        } = self.strategy
        {
            if check_interval_ms == 0 {
                return Err(ConfigError::ZeroCheckInterval);
            }
            check_probability("distractor probability", probability)?;
        }
        if let IntensityMode::Random { levels } = &self.intensity {
            if levels.is_empty() {
                return Err(ConfigError::NoIntensityLevels);
            }
        }
        Ok(())
    }
}

/// Chance that a periodic roll fires when none is configured.
pub const DEFAULT_PERIODIC_PROBABILITY: f64 = 0.35;

/// How distractor firing times are chosen. Strategies are never combined
/// within a session since they yield different timing statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistractorStrategy {
    /// `count` offsets drawn uniformly at start, none within `margin_ms` of either end.
    Scheduled { count: u32, margin_ms: u64 },
    /// Pre-scheduled plan with known offsets, e.g. replaying an earlier session.
    Explicit { offsets_ms: Vec<u64> },
    /// Independent draw every `check_interval_ms` while running.
    Periodic {
        check_interval_ms: u64,
        probability: f64,
    },
}

impl Default for DistractorStrategy {
    fn default() -> Self {
        DistractorStrategy::Scheduled {
            count: 4,
            margin_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractorModality {
    Audio,
    Visual,
    /// Audio or visual with equal probability per event.
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IntensityMode {
    Fixed { value: u8 },
    Random { levels: Vec<IntensityLevel> },
}

impl Default for IntensityMode {
    fn default() -> Self {
        IntensityMode::Fixed { value: 35 }
    }
}

impl IntensityMode {
    pub fn three_levels() -> Self {
        IntensityMode::Random {
            levels: vec![
                IntensityLevel::new("low", 20),
                IntensityLevel::new("mid", 35),
                IntensityLevel::new("high", 55),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityLevel {
    pub name: String,
    /// Percentage in `[0, 100]`; larger values are clamped.
    pub value: u8,
}

impl IntensityLevel {
    pub fn new(name: impl Into<String>, value: u8) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub frequency_hz: f32,
    pub duration_ms: u64,
    /// Gain reached at an intensity of 100.
    pub max_gain: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            duration_ms: 180,
            max_gain: 0.40,
        }
    }
}

/// What happens to a distractor tag that no trial has consumed yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MailboxPolicy {
    /// Single slot; a newer distractor overwrites an unconsumed one.
    #[default]
    Latest,
    /// Bounded FIFO drained one tag per presentation; the oldest tag is
    /// dropped when full.
    Queue { capacity: usize },
}
