// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Append-only result store, one JSON object per line and per test.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::rng_testing::ResultRecord;
use crate::sequence::NormalizedSequence;
use crate::stats::TestKind;

/// Destination of finished sweep records.
pub trait ResultSink {
    fn append(&mut self, record: &ResultRecord) -> io::Result<()>;
}

impl ResultSink for Vec<ResultRecord> {
    fn append(&mut self, record: &ResultRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// One persisted test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub generator: String,
    pub test: TestKind,
    pub m: u64,
    pub n: usize,
    pub tuning_param: u64,
    pub alpha: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub rejected: bool,
    pub sample: NormalizedSequence,
    pub elapsed_secs: f64,
    pub inserted_at: DateTime<Utc>,
}

impl StoredRow {
    /// Split a record into one row per test.
    pub fn from_record(record: &ResultRecord) -> [StoredRow; 2] {
        let inserted_at = Utc::now();
        record.outcomes().map(|(test, outcome)| StoredRow {
            generator: record.generator.clone(),
            test,
            m: record.m,
            n: record.n,
            tuning_param: record.tuning_param,
            alpha: record.alpha,
            statistic: outcome.statistic,
            p_value: outcome.p_value,
            rejected: outcome.rejected,
            sample: record.sample.clone(),
            elapsed_secs: record.elapsed.as_secs_f64(),
            inserted_at,
        })
    }
}

/// JSON lines file of [`StoredRow`]s. Every append is flushed before it
/// returns, a crash loses at most the record being written.
pub struct JsonLinesStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesStore {
    /// Create the store, replacing an existing file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        debug!(path = %path.display(), "created result store");
        Ok(JsonLinesStore {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }
}

impl ResultSink for JsonLinesStore {
    fn append(&mut self, record: &ResultRecord) -> io::Result<()> {
        for row in StoredRow::from_record(record) {
            serde_json::to_writer(&mut self.writer, &row)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        debug!(
            path = %self.path.display(),
            generator = %record.generator,
            m = record.m,
            "appended record"
        );
        Ok(())
    }
}

/// Read every row of a store file. Blank lines are skipped.
pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<StoredRow>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

/// Store files of every batch in `dir`, ordered by batch index.
pub fn store_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let batch = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("test_"))
            .and_then(|name| name.strip_suffix(".jsonl"))
            .and_then(|index| index.parse().ok());
        if let Some(batch) = batch {
            files.push((batch, path));
        }
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Rows of every batch store in `dir`.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<StoredRow>> {
    let mut rows = Vec::new();
    for path in store_files(dir)? {
        rows.extend(load_rows(&path)?);
    }
    Ok(rows)
}

/// Rows of `generator`, ordered by m ascending.
pub fn rows_for<'a>(rows: &'a [StoredRow], generator: &str) -> Vec<&'a StoredRow> {
    let mut selected: Vec<&StoredRow> = rows.iter().filter(|r| r.generator == generator).collect();
    selected.sort_by_key(|r| r.m);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::RawSequence;
    use crate::stats::TestOutcome;
    use std::time::Duration;

    fn record(generator: &str, m: u64) -> ResultRecord {
        let outcome = |rejected| TestOutcome {
            statistic: 1.5,
            p_value: if rejected { 0.01 } else { 0.5 },
            rejected,
        };
        ResultRecord {
            generator: generator.to_owned(),
            m,
            n: 3,
            tuning_param: 5,
            alpha: 0.05,
            seed: 1,
            sample: RawSequence::new(m, vec![0, m / 2, m]).normalize(),
            ks: outcome(false),
            chi2: outcome(true),
            elapsed: Duration::from_micros(250),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn record_splits_into_one_row_per_test() {
        let rows = StoredRow::from_record(&record("switch", 100));
        assert_eq!(rows[0].test, TestKind::KolmogorovSmirnov);
        assert!(!rows[0].rejected);
        assert_eq!(rows[1].test, TestKind::ChiSquared);
        assert!(rows[1].rejected);
        assert_eq!(rows[0].inserted_at, rows[1].inserted_at);
        assert!((rows[1].elapsed_secs - 0.00025).abs() < 1e-12);
    }

    #[test]
    fn appended_rows_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test_0.jsonl");
        let mut store = JsonLinesStore::create(&path).unwrap();
        store.append(&record("switch", 1000)).unwrap();
        store.append(&record("switch", 100)).unwrap();
        store.append(&record("hybrid", 10)).unwrap();
        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].sample, record("x", 1000).sample);

        let switch = rows_for(&rows, "switch");
        let moduli: Vec<u64> = switch.iter().map(|r| r.m).collect();
        assert_eq!(moduli, vec![100, 100, 1000, 1000]);
        assert!(rows_for(&rows, "xor").is_empty());
    }

    #[test]
    fn smallest_modulus_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_0.jsonl");
        JsonLinesStore::create(&path)
            .unwrap()
            .append(&record("hybrid", 1))
            .unwrap();
        let rows = load_rows(&path).unwrap();
        assert_eq!(rows[0].m, 1);
        assert_eq!(rows[0].sample.as_slice(), &[0.0, 0.0, 0.5]);
    }

    #[test]
    fn create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_0.jsonl");
        JsonLinesStore::create(&path)
            .unwrap()
            .append(&record("switch", 10))
            .unwrap();
        JsonLinesStore::create(&path).unwrap();
        assert!(load_rows(&path).unwrap().is_empty());
    }

    #[test]
    fn corrupt_line_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_0.jsonl");
        fs::write(&path, "{\"generator\": 3}\n").unwrap();
        assert!(matches!(
            load_rows(&path),
            Err(crate::error::Error::Serialization(_))
        ));
    }

    #[test]
    fn directory_scan_orders_batches() {
        let dir = tempfile::tempdir().unwrap();
        for batch in [10, 2, 0] {
            let path = dir.path().join(format!("test_{}.jsonl", batch));
            JsonLinesStore::create(&path)
                .unwrap()
                .append(&record("hybrid", batch + 1))
                .unwrap();
        }
        fs::write(dir.path().join("report_0.txt"), "ignored").unwrap();
        let files = store_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test_0.jsonl", "test_2.jsonl", "test_10.jsonl"]);
        let rows = load_dir(dir.path()).unwrap();
        let moduli: Vec<u64> = rows.iter().map(|r| r.m).collect();
        assert_eq!(moduli, vec![1, 1, 3, 3, 11, 11]);
    }
}
