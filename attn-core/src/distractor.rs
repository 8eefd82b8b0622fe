use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistractorKind {
    Audio,
    Visual,
}

/// Intensity actually used for a tone distractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneIntensity {
    /// Category name, `fixed` in single-level mode.
    pub level: String,
    /// Percentage setting the gain was derived from.
    pub raw_value: u8,
    pub gain: f32,
}

/// A distractor that fired, as carried by the trial that follows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractorEvent {
    pub offset_rel_ms: u64,
    pub kind: DistractorKind,
    pub intensity: Option<ToneIntensity>,
}

/// Distractor context attached to a trial when it is presented
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "window", rename_all = "snake_case")]
pub enum DistractorTag {
    #[default]
    Baseline,
    PostDistractor(DistractorEvent),
}

impl DistractorTag {
    pub fn label(&self) -> &'static str {
        match self {
            DistractorTag::Baseline => "baseline",
            DistractorTag::PostDistractor(event) => match event.kind {
                DistractorKind::Audio => "post_beep",
                DistractorKind::Visual => "post_visual",
            },
        }
    }

    pub fn event(&self) -> Option<&DistractorEvent> {
        match self {
            DistractorTag::Baseline => None,
            DistractorTag::PostDistractor(event) => Some(event),
        }
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, DistractorTag::Baseline)
    }
}

impl From<Option<DistractorEvent>> for DistractorTag {
    fn from(event: Option<DistractorEvent>) -> Self {
        event.map_or(DistractorTag::Baseline, DistractorTag::PostDistractor)
    }
}
