use anyhow::{Context, Result};
use attn_core::TrialRecord;
use attn_engine::{write_csv, write_json};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[value(name = "csv")]
    Csv,
    #[value(name = "json")]
    Json,
    #[value(name = "both")]
    Both,
}

/// `attention2_2024-05-01-13-45-09`, UTC
pub fn file_stem(at: DateTime<Utc>) -> String {
    format!("attention2_{}", at.format("%Y-%m-%d-%H-%M-%S"))
}

/// Writes the dataset into `dir` and returns the files created.
pub fn write_dataset(records: &[TrialRecord], dir: &Path, format: Format) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let stem = file_stem(Utc::now());
    let mut written = Vec::new();

    if matches!(format, Format::Csv | Format::Both) {
        let path = dir.join(format!("{stem}.csv"));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_csv(records, BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    if matches!(format, Format::Json | Format::Both) {
        let path = dir.join(format!("{stem}.json"));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_json(records, BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stem_uses_dashes_throughout() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 9).unwrap();
        assert_eq!(file_stem(at), "attention2_2024-05-01-13-45-09");
    }

    #[test]
    fn writes_both_formats() {
        let dir = std::env::temp_dir().join(format!("attention-task-{}", std::process::id()));
        let written = write_dataset(&[], &dir, Format::Both).unwrap();

        assert_eq!(written.len(), 2);
        let csv = fs::read_to_string(&written[0]).unwrap();
        assert!(csv.starts_with("trialIndex,cueLabel,"));
        let json = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(json.trim(), "[]");

        fs::remove_dir_all(dir).unwrap();
    }
}
