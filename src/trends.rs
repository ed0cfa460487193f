//! Trend and anomaly analysis over cycle history.
//!
//! Variability is measured on the actual elapsed days between consecutive
//! period starts rather than on the `cycle_length` stored per record, which
//! may only be a user estimate.

use std::collections::BTreeMap;

use crate::dates;
use crate::models::{Anomaly, CycleRecord, SymptomLog, TrendReport};
use crate::stats;

/// Fewer cycles than this is not enough to make trend claims.
pub const MIN_CYCLES_FOR_TRENDS: usize = 5;

const TYPICAL_CYCLE_RANGE: (i64, i64) = (21, 35);
const LONG_PERIOD_DAYS: u32 = 7;
const EXTENDED_GAP_DAYS: i64 = 90;

/// Days between each pair of consecutive period starts, in date order.
pub fn consecutive_gaps(cycles: &[CycleRecord]) -> Vec<i64> {
    let mut starts: Vec<_> = cycles.iter().map(|c| c.start_date).collect();
    starts.sort();
    starts
        .windows(2)
        .map(|w| dates::days_between(w[0], w[1]))
        .collect()
}

pub fn analyze_trends(
    cycles: &[CycleRecord],
    symptom_logs: &[SymptomLog],
) -> Option<TrendReport> {
    if cycles.len() < MIN_CYCLES_FOR_TRENDS {
        tracing::debug!(cycles = cycles.len(), "not enough history for trend analysis");
        return None;
    }

    let gaps = consecutive_gaps(cycles);
    let values: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();

    let mean = stats::mean(&values);
    let std_dev = stats::population_std_dev(&values, mean);
    let period_lengths: Vec<f64> = cycles.iter().map(|c| f64::from(c.period_length)).collect();

    let (symptom_frequency, mood_frequency) = symptom_frequencies(symptom_logs);

    let report = TrendReport {
        cycles_analyzed: cycles.len(),
        mean_cycle_length: mean,
        median_cycle_length: stats::median(&values),
        standard_deviation: std_dev,
        median_absolute_deviation: stats::median_absolute_deviation(&values),
        coefficient_of_variation: stats::coefficient_of_variation(std_dev, mean),
        shortest_cycle: gaps.iter().copied().min().unwrap_or(0),
        longest_cycle: gaps.iter().copied().max().unwrap_or(0),
        average_period_length: stats::mean(&period_lengths),
        anomalies: detect_anomalies(cycles, &gaps),
        symptom_frequency,
        mood_frequency,
    };

    tracing::debug!(
        cycles = report.cycles_analyzed,
        anomalies = report.anomalies.len(),
        "trend report computed"
    );

    Some(report)
}

/// Anomalies in a fixed order: out-of-range gaps, long periods, then
/// extended gaps. A non-positive gap (duplicate or misordered start date)
/// is reported as an out-of-range length.
fn detect_anomalies(cycles: &[CycleRecord], gaps: &[i64]) -> Vec<Anomaly> {
    let (lo, hi) = TYPICAL_CYCLE_RANGE;
    let mut anomalies: Vec<Anomaly> = gaps
        .iter()
        .enumerate()
        .filter(|&(_, &gap)| gap < lo || gap > hi)
        .map(|(i, &gap)| Anomaly::IrregularLength {
            index: i + 1,
            days: gap,
        })
        .collect();

    let long_periods = cycles
        .iter()
        .filter(|c| c.period_length > LONG_PERIOD_DAYS)
        .count();
    if long_periods > 0 {
        anomalies.push(Anomaly::LongPeriods {
            count: long_periods,
        });
    }

    let extended: Vec<i64> = gaps
        .iter()
        .copied()
        .filter(|&g| g >= EXTENDED_GAP_DAYS)
        .collect();
    if let Some(&longest) = extended.iter().max() {
        anomalies.push(Anomaly::ExtendedGap {
            count: extended.len(),
            longest,
        });
    }

    anomalies
}

/// Occurrence counts of symptom labels and moods. The logs are expected to
/// be pre-filtered to one user; blank labels are skipped.
pub fn symptom_frequencies(
    logs: &[SymptomLog],
) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut symptoms = BTreeMap::new();
    let mut moods = BTreeMap::new();

    for log in logs {
        let mood = log.mood.trim();
        if !mood.is_empty() {
            *moods.entry(mood.to_string()).or_insert(0) += 1;
        }
        for symptom in &log.symptoms {
            let symptom = symptom.trim();
            if !symptom.is_empty() {
                *symptoms.entry(symptom.to_string()).or_insert(0) += 1;
            }
        }
    }

    (symptoms, moods)
}
