use std::io::Write;

use attn_core::TrialRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode dataset as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub const CSV_HEADER: [&str; 14] = [
    "trialIndex",
    "cueLabel",
    "expectedResponse",
    "choice",
    "isCorrect",
    "reactionTimeMs",
    "presentedAtRelMs",
    "minuteBin",
    "distractorTag",
    "omission",
    "beepLevel",
    "beepRawValue",
    "beepGainUsed",
    "beepOffsetRelMs",
];

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape(field: String) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field
    }
}

fn csv_row(record: &TrialRecord) -> Vec<String> {
    let event = record.distractor_tag.event();
    let intensity = event.and_then(|e| e.intensity.as_ref());

    vec![
        record.trial_index.to_string(),
        record.cue_label.to_string(),
        record.expected_response.to_string(),
        opt(record.choice),
        opt(record.is_correct.map(flag)),
        opt(record.reaction_time_ms),
        record.presented_at_rel_ms.to_string(),
        record.minute_bin.to_string(),
        record.distractor_tag.label().to_string(),
        flag(record.omission),
        opt(intensity.map(|i| i.level.clone())),
        opt(intensity.map(|i| i.raw_value)),
        opt(intensity.map(|i| format!("{:.3}", i.gain))),
        opt(event.map(|e| e.offset_rel_ms)),
    ]
}

/// Writes the dataset as CSV with a header row; inapplicable fields are empty.
pub fn write_csv<W: Write>(records: &[TrialRecord], mut out: W) -> Result<(), ExportError> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for record in records {
        let row: Vec<String> = csv_row(record).into_iter().map(escape).collect();
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[TrialRecord]) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_csv(records, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn write_json<W: Write>(records: &[TrialRecord], mut out: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut out, records)?;
    out.flush()?;
    Ok(())
}
