use chrono::NaiveDate;

use crate::dates;
use crate::models::{
    clamp_length, CycleRecord, CycleStats, PredictionResult, UserProfile, CYCLE_LENGTH_RANGE,
    PERIOD_LENGTH_RANGE,
};
use crate::stats;
use crate::trends::consecutive_gaps;

/// Days between ovulation and the next period. Held fixed regardless of
/// cycle length; this is a heuristic, not a physiological model.
pub const LUTEAL_PHASE_DAYS: i64 = 14;
const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

const BASE_CONFIDENCE: i32 = 50;
const MIN_CONFIDENCE: i32 = 10;
const MAX_CONFIDENCE: i32 = 95;
const RECENT_WINDOW_DAYS: i64 = 180;

/// Predict the next period from `profile.last_period_date`.
/// Returns `None` when the profile has no anchor date, or when the anchor is
/// so close to the end of the calendar that the prediction cannot be dated.
///
/// Averages taken from history are clamped to the same plausible ranges as
/// the profile defaults; variability and confidence still describe the
/// recorded lengths as they are.
pub fn predict(
    cycles: &[CycleRecord],
    profile: &UserProfile,
    today: NaiveDate,
) -> Option<PredictionResult> {
    let last_period = profile.last_period_date?;

    let (average_cycle_length, predicted_period_length, cycle_variability, confidence) =
        if cycles.is_empty() {
            (
                profile.cycle_length(),
                profile.period_length(),
                0.0,
                BASE_CONFIDENCE as u8,
            )
        } else {
            let cycle_lengths: Vec<f64> =
                cycles.iter().map(|c| f64::from(c.cycle_length)).collect();
            let period_lengths: Vec<f64> =
                cycles.iter().map(|c| f64::from(c.period_length)).collect();

            let avg_cycle = stats::mean(&cycle_lengths).round();
            let avg_period = stats::mean(&period_lengths).round();
            let variability = stats::population_std_dev(&cycle_lengths, avg_cycle);

            (
                clamp_length("average_cycle_length", avg_cycle as u32, CYCLE_LENGTH_RANGE),
                clamp_length("predicted_period_length", avg_period as u32, PERIOD_LENGTH_RANGE),
                variability,
                score_confidence(cycles, variability, today),
            )
        };

    let Some(next_period_date) = dates::add_days(last_period, i64::from(average_cycle_length))
    else {
        tracing::warn!(%last_period, average_cycle_length, "next period date out of range");
        return None;
    };
    let ovulation_date = dates::add_days(next_period_date, -LUTEAL_PHASE_DAYS)?;

    let result = PredictionResult {
        next_period_date,
        ovulation_date,
        fertile_window_start: dates::add_days(ovulation_date, -FERTILE_DAYS_BEFORE_OVULATION)?,
        fertile_window_end: dates::add_days(ovulation_date, FERTILE_DAYS_AFTER_OVULATION)?,
        confidence,
        average_cycle_length,
        predicted_period_length,
        cycle_variability,
    };

    tracing::debug!(
        cycles = cycles.len(),
        next = %result.next_period_date,
        confidence = result.confidence,
        "period predicted"
    );

    Some(result)
}

/// Heuristic confidence percentage from data volume, variability and
/// how recent the history is. Always within 10..=95.
pub fn score_confidence(cycles: &[CycleRecord], variability: f64, today: NaiveDate) -> u8 {
    let mut score = BASE_CONFIDENCE;

    let count = cycles.len();
    if count >= 3 {
        score += 20;
    }
    if count >= 6 {
        score += 15;
    }
    if count >= 12 {
        score += 10;
    }

    score += if variability <= 2.0 {
        15
    } else if variability <= 4.0 {
        10
    } else if variability <= 6.0 {
        5
    } else {
        -10
    };

    let recent = cycles
        .iter()
        .filter(|c| (0..=RECENT_WINDOW_DAYS).contains(&dates::days_between(c.start_date, today)))
        .count();
    if recent >= 3 {
        score += 10;
    }

    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u8
}

/// Summary statistics for the stats view. Works for any history size and
/// uses the same consecutive-gap lengths as trend analysis.
pub fn cycle_stats(cycles: &[CycleRecord]) -> CycleStats {
    let mut sorted: Vec<&CycleRecord> = cycles.iter().collect();
    sorted.sort_by_key(|c| c.start_date);

    let Some(last) = sorted.last() else {
        return CycleStats {
            total_cycles: 0,
            avg_cycle_length: None,
            avg_period_length: None,
            shortest_cycle: None,
            longest_cycle: None,
            last_period_start: None,
            last_period_end: None,
        };
    };

    let gaps = consecutive_gaps(cycles);
    let gap_values: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();
    let period_lengths: Vec<f64> = sorted.iter().map(|c| f64::from(c.period_length)).collect();

    CycleStats {
        total_cycles: sorted.len(),
        avg_cycle_length: (!gap_values.is_empty()).then(|| stats::mean(&gap_values)),
        avg_period_length: Some(stats::mean(&period_lengths)),
        shortest_cycle: gaps.iter().copied().min(),
        longest_cycle: gaps.iter().copied().max(),
        last_period_start: Some(last.start_date),
        last_period_end: last.end_date,
    }
}
