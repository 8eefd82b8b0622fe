pub mod collaborators;
pub mod config;
pub mod distractor;
pub mod export;
pub mod recorder;
pub mod response;
pub mod sequence;
pub mod simulate;
pub mod state;
pub mod trial;

pub use collaborators::{CollaboratorError, NoopPresenter, Presenter, SilentVoice, Tone, Voice};
pub use config::{
    ConfigError, DEFAULT_PERIODIC_PROBABILITY, DistractorConfig, DistractorModality,
    DistractorStrategy, IntensityLevel, IntensityMode, MailboxPolicy, SessionConfig, ToneConfig,
};
pub use distractor::{DistractorInjector, DistractorTimer, TagMailbox};
pub use export::{ExportError, write_csv, write_json};
pub use recorder::{SessionRecorder, SessionSummary};
pub use response::{IgnoreReason, ResponseGate, ResponseOutcome};
pub use sequence::{SequenceGenerator, SequenceState};
pub use simulate::{SyntheticParticipant, run_virtual_session};
pub use state::{AttentionSession, ScheduledEvent};
pub use trial::Trial;
