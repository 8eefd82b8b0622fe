pub mod cue;
pub mod distractor;
pub mod status;
pub mod trial;

pub use cue::{Choice, Cue, CueLabel};
pub use distractor::{DistractorEvent, DistractorKind, DistractorTag, ToneIntensity};
pub use status::SessionStatus;
pub use trial::{Resolution, TrialRecord};
