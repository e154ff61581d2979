// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Sweep of the registered generators over a geometric range of moduli.
//!
//! Every case builds a fresh generator, normalizes its output once, runs
//! both goodness of fit tests on it and hands the assembled record to a
//! [`ResultSink`]. Timing runs on separate instances built from the same
//! seed, so the tested sample never depends on how often it was timed.

use std::{
    fs::File,
    hint::black_box,
    io,
    ops::Mul,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::registry::Algorithm;
use crate::sequence::{NormalizedSequence, SequenceRequest};
use crate::stats::{self, TestKind, TestOutcome};
use crate::store::{JsonLinesStore, ResultSink};
use crate::{strings, utils};

/// Accepted fits with a p log stat at or above this are suspiciously good.
const P_LOG_STAT_LIMIT: f64 = 3.0;

/// Everything known about one (generator, m) case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub generator: String,
    pub m: u64,
    pub n: usize,
    pub tuning_param: u64,
    pub alpha: f64,
    pub seed: u64,
    pub sample: NormalizedSequence,
    pub ks: TestOutcome,
    pub chi2: TestOutcome,
    /// Mean duration of one generation call.
    pub elapsed: Duration,
    pub recorded_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn outcomes(&self) -> [(TestKind, &TestOutcome); 2] {
        [
            (TestKind::KolmogorovSmirnov, &self.ks),
            (TestKind::ChiSquared, &self.chi2),
        ]
    }

    /// Generated bytes per second, counting 8 bytes per value.
    pub fn speed(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.n * 8) as f64 / secs
        } else {
            f64::INFINITY
        }
    }

    pub fn format(&self) -> String {
        let tests = self
            .outcomes()
            .iter()
            .map(|(kind, outcome)| {
                format!(
                    "{:<4}: {:>10.4}  p: {:.6}  pls: {:.4} - {:<9}",
                    kind.name(),
                    outcome.statistic,
                    outcome.p_value,
                    p_log_stat(outcome.p_value),
                    verdict(outcome)
                )
            })
            .collect::<Vec<String>>()
            .join("  ");
        format!(
            "m: {:<14} Time: {:<11} ({}/s)  {}",
            self.m,
            utils::format_elapsed_time(self.elapsed),
            utils::format_byte_count(self.speed().min(usize::MAX as f64) as usize),
            tests
        )
    }
}

/// Logarithmic quantity to specify how close to 1.0 or 0.0 a p-value is.
/// Has a range of 0-9.9999.
/// -0.2 * (log2(min(p, 1-p)) - 1) clamped to 9.9999
fn p_log_stat(p: f64) -> f64 {
    (p.min(1.0 - p).log2() - 1.0).mul(-0.2).min(9.9999)
}

fn verdict(outcome: &TestOutcome) -> &'static str {
    if outcome.rejected {
        strings::FAIL_STR
    } else if p_log_stat(outcome.p_value) >= P_LOG_STAT_LIMIT {
        strings::MARGINAL_STR
    } else {
        strings::PASS_STR
    }
}

/// Print a report line, and append it to the report file when there is one.
fn report(text: impl AsRef<str>, report_path: Option<&Path>) -> io::Result<()> {
    match report_path {
        Some(path) => utils::write_and_print(text, path),
        None => {
            println!("{}", text.as_ref());
            Ok(())
        }
    }
}

/// Mean duration of one generation call over `config.timing_repetitions`
/// fresh instances. Construction is not timed.
fn time_generation(
    config: &SweepConfig,
    algorithm: Algorithm,
    request: &SequenceRequest,
    seed: u64,
) -> Result<Duration> {
    let mut total = Duration::ZERO;
    for _ in 0..config.timing_repetitions {
        let mut generator =
            algorithm.instantiate_with(&config.chaos, seed, config.seed_policy.entropy(seed));
        let start = Instant::now();
        let raw = generator.generate(black_box(request))?;
        total += start.elapsed();
        black_box(raw);
    }
    Ok(total / config.timing_repetitions)
}

/// Generate, normalize, test and time one case.
pub fn run_case(
    config: &SweepConfig,
    algorithm: Algorithm,
    m: u64,
    tuning_param: u64,
    seed: u64,
) -> Result<ResultRecord> {
    let request = SequenceRequest::new(m, config.n, tuning_param)?
        .with_reseed_fraction(config.reseed_fraction)?;
    let sample = algorithm
        .instantiate_with(&config.chaos, seed, config.seed_policy.entropy(seed))
        .generate(&request)?
        .normalize();
    let ks = stats::kolmogorov_smirnov(sample.as_slice(), config.alpha)?;
    let chi2 = stats::chi_squared(sample.as_slice(), config.chi_squared_bins, config.alpha)?;
    let elapsed = time_generation(config, algorithm, &request, seed)?;
    Ok(ResultRecord {
        generator: algorithm.name().to_owned(),
        m,
        n: config.n,
        tuning_param,
        alpha: config.alpha,
        seed,
        sample,
        ks,
        chi2,
        elapsed,
        recorded_at: Utc::now(),
    })
}

/// Sweep every configured generator over every modulus with the tuning
/// parameter of `batch`, appending each record to `sink` as soon as it is
/// complete. Returns the number of records written.
///
/// A failing sink stops the sweep; records appended before stay intact.
pub fn run_sweep(
    config: &SweepConfig,
    batch: u32,
    sink: &mut impl ResultSink,
    report_path: Option<&Path>,
) -> Result<usize> {
    config.validate()?;
    let tuning_param = SweepConfig::tuning_param(batch)?;
    let sweep_start = Instant::now();
    info!(
        batch,
        tuning_param,
        generators = config.algorithms.len(),
        "starting sweep"
    );
    report(
        format!("\nBatch {} (a = {})", batch, tuning_param),
        report_path,
    )?;
    let mut written = 0usize;
    for &algorithm in &config.algorithms {
        report(format!("\nTesting: {}", algorithm), report_path)?;
        let mut rejections = 0usize;
        let mut cases = 0usize;
        for m in config.moduli() {
            let seed = config.seed_policy.case_seed();
            let record = run_case(config, algorithm, m, tuning_param, seed)?;
            debug!(
                generator = %algorithm,
                m,
                seed,
                ks_p = record.ks.p_value,
                chi2_p = record.chi2.p_value,
                "case finished"
            );
            let persist_error = |source| Error::Persist {
                generator: record.generator.clone(),
                m,
                source,
            };
            sink.append(&record).map_err(persist_error)?;
            report(record.format(), report_path).map_err(persist_error)?;
            rejections += record.outcomes().iter().filter(|(_, o)| o.rejected).count();
            cases += 2;
            written += 1;
        }
        report(
            format!(
                "Summary for {}: {} / {} tests rejected",
                algorithm, rejections, cases
            ),
            report_path,
        )?;
    }
    report(
        format!("Batch {} runtime: {:?}", batch, sweep_start.elapsed()),
        report_path,
    )?;
    info!(batch, records = written, "sweep finished");
    Ok(written)
}

/// One batch with its own store and report file under the output directory.
fn run_batch(config: &SweepConfig, batch: u32) -> Result<usize> {
    let mut store = JsonLinesStore::create(config.store_path(batch))?;
    let report_path = config.report_path(batch);
    File::create(&report_path)?;
    run_sweep(config, batch, &mut store, Some(&report_path))
}

/// Run batches `0..config.batches` in parallel, one thread each.
/// Returns the total number of records, or the first batch error.
pub fn run_batches(config: &SweepConfig) -> Result<usize> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir)?;
    let results: Vec<Result<usize>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.batches)
            .map(|batch| (batch, scope.spawn(move || run_batch(config, batch))))
            .collect();
        handles
            .into_iter()
            .map(|(batch, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(Error::WorkerPanicked(batch)))
            })
            .collect()
    });
    let mut total = 0usize;
    let mut first_error = None;
    for (batch, result) in results.into_iter().enumerate() {
        match result {
            Ok(count) => total += count,
            Err(err) => {
                warn!(batch, error = %err, "batch failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(total),
    }
}
