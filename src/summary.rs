// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Textual summaries of persisted results.

use std::time::Duration;

use crate::stats::TestKind;
use crate::store::{self, StoredRow};
use crate::{strings, utils};

/// Rejection counts of one generator over every stored case.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSummary {
    pub generator: String,
    pub ks_rejected: usize,
    pub chi2_rejected: usize,
    /// Number of (m, batch) cases, each tested once by both tests.
    pub cases: usize,
    /// Largest significance level among the cases.
    pub alpha: f64,
    total_elapsed_secs: f64,
}

impl GeneratorSummary {
    fn new(generator: &str) -> Self {
        GeneratorSummary {
            generator: generator.to_owned(),
            ks_rejected: 0,
            chi2_rejected: 0,
            cases: 0,
            alpha: 0.0,
            total_elapsed_secs: 0.0,
        }
    }

    fn rate(&self, rejected: usize) -> f64 {
        if self.cases == 0 {
            0.0
        } else {
            rejected as f64 / self.cases as f64 * 100.0
        }
    }

    /// Percentage of cases rejected by the KS test.
    pub fn ks_rate(&self) -> f64 {
        self.rate(self.ks_rejected)
    }

    pub fn chi2_rate(&self) -> f64 {
        self.rate(self.chi2_rejected)
    }

    pub fn mean_elapsed(&self) -> Duration {
        if self.cases == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total_elapsed_secs / self.cases as f64)
        }
    }

    /// A uniform source is rejected in about alpha of all cases. Anything
    /// above twice that fails.
    pub fn passed(&self) -> bool {
        let limit = 2.0 * self.alpha * 100.0;
        self.ks_rate() <= limit && self.chi2_rate() <= limit
    }

    pub fn format(&self) -> String {
        format!(
            "{:<24}: Chi2 = {:>6.2}%;  KS = {:>6.2}%;  [{:04}:{:04}:{}]  Exec. time: {:<11} - {}",
            self.generator,
            self.chi2_rate(),
            self.ks_rate(),
            self.chi2_rejected,
            self.ks_rejected,
            self.cases,
            utils::format_elapsed_time(self.mean_elapsed()),
            if self.passed() {
                strings::PASS_STR
            } else {
                strings::FAIL_STR
            }
        )
    }
}

/// Summaries in order of first appearance. Elapsed time is counted from the
/// KS rows only, both rows of a case carry the same value.
pub fn summarize(rows: &[StoredRow]) -> Vec<GeneratorSummary> {
    let mut summaries: Vec<GeneratorSummary> = Vec::new();
    for row in rows {
        let idx = match summaries.iter().position(|s| s.generator == row.generator) {
            Some(idx) => idx,
            None => {
                summaries.push(GeneratorSummary::new(&row.generator));
                summaries.len() - 1
            }
        };
        let summary = &mut summaries[idx];
        summary.alpha = summary.alpha.max(row.alpha);
        match row.test {
            TestKind::KolmogorovSmirnov => {
                summary.cases += 1;
                summary.total_elapsed_secs += row.elapsed_secs;
                summary.ks_rejected += row.rejected as usize;
            }
            TestKind::ChiSquared => summary.chi2_rejected += row.rejected as usize,
        }
    }
    summaries
}

pub fn format_summary(summaries: &[GeneratorSummary]) -> String {
    let lines: Vec<String> = summaries.iter().map(GeneratorSummary::format).collect();
    format!("Rejection Rates:\n{}", lines.join("\n"))
}

/// Statistic and p value of both tests for every stored m of `generator`.
pub fn format_generator_table(rows: &[StoredRow], generator: &str) -> String {
    let mut lines = vec![
        format!("Results for: {}", generator),
        format!(
            "{:>14} {:>12} {:>10} {:>10} {:>12} {:>10}",
            "m", "a", "KS D", "KS p", "Chi2", "Chi2 p"
        ),
    ];
    let selected = store::rows_for(rows, generator);
    let ks_rows = selected
        .iter()
        .filter(|r| r.test == TestKind::KolmogorovSmirnov);
    for ks in ks_rows {
        let chi2 = selected.iter().find(|r| {
            r.test == TestKind::ChiSquared
                && r.m == ks.m
                && r.tuning_param == ks.tuning_param
                && r.inserted_at == ks.inserted_at
        });
        let (chi2_stat, chi2_p) = chi2.map_or((f64::NAN, f64::NAN), |r| (r.statistic, r.p_value));
        lines.push(format!(
            "{:>14} {:>12} {:>10.6} {:>10.6} {:>12.4} {:>10.6}",
            ks.m, ks.tuning_param, ks.statistic, ks.p_value, chi2_stat, chi2_p
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::RawSequence;
    use chrono::{TimeZone, Utc};

    fn row(generator: &str, test: TestKind, m: u64, rejected: bool, secs: f64) -> StoredRow {
        StoredRow {
            generator: generator.to_owned(),
            test,
            m,
            n: 2,
            tuning_param: 5,
            alpha: 0.05,
            statistic: m as f64,
            p_value: if rejected { 0.001 } else { 0.4 },
            rejected,
            sample: RawSequence::new(m, vec![0, 1]).normalize(),
            elapsed_secs: secs,
            inserted_at: Utc.timestamp_opt(1_700_000_000 + m as i64, 0).unwrap(),
        }
    }

    fn case(generator: &str, m: u64, ks: bool, chi2: bool, secs: f64) -> [StoredRow; 2] {
        [
            row(generator, TestKind::KolmogorovSmirnov, m, ks, secs),
            row(generator, TestKind::ChiSquared, m, chi2, secs),
        ]
    }

    #[test]
    fn rates_and_mean_time() {
        let mut rows = Vec::new();
        rows.extend(case("switch", 100, false, false, 0.002));
        rows.extend(case("randu", 100, true, true, 0.001));
        rows.extend(case("switch", 1000, false, true, 0.004));
        rows.extend(case("randu", 1000, true, false, 0.001));
        let summaries = summarize(&rows);
        assert_eq!(summaries.len(), 2);

        let switch = &summaries[0];
        assert_eq!(switch.generator, "switch");
        assert_eq!(switch.cases, 2);
        assert_eq!(switch.ks_rejected, 0);
        assert_eq!(switch.chi2_rejected, 1);
        assert_eq!(switch.chi2_rate(), 50.0);
        assert_eq!(switch.ks_rate(), 0.0);
        assert!((switch.mean_elapsed().as_secs_f64() - 0.003).abs() < 1e-9);
        assert!(!switch.passed());

        let randu = &summaries[1];
        assert_eq!(randu.ks_rate(), 100.0);
        assert!(randu.format().contains(strings::FAIL_STR));
    }

    #[test]
    fn clean_generator_passes() {
        let mut rows = Vec::new();
        for m in [10, 100, 1000, 10_000] {
            rows.extend(case("pcg32", m, false, false, 0.0001));
        }
        let summaries = summarize(&rows);
        assert!(summaries[0].passed());
        let text = format_summary(&summaries);
        assert!(text.starts_with("Rejection Rates:\npcg32"));
        assert!(text.contains("[0000:0000:4]"));
        assert!(text.contains(strings::PASS_STR));
    }

    #[test]
    fn table_is_ordered_by_modulus() {
        let mut rows = Vec::new();
        rows.extend(case("xor", 1000, false, false, 0.0));
        rows.extend(case("xor", 100, true, false, 0.0));
        rows.extend(case("hybrid", 10, false, false, 0.0));
        let table = format_generator_table(&rows, "xor");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Results for: xor");
        assert!(lines[2].trim_start().starts_with("100 "));
        assert!(lines[3].trim_start().starts_with("1000 "));
        assert!(lines[3].contains("1000.0000"));
    }
}
