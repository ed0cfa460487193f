use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates;
use crate::reminders::ReminderSettings;

pub const FALLBACK_CYCLE_LENGTH: u32 = 28;
pub const FALLBACK_PERIOD_LENGTH: u32 = 5;

pub(crate) const CYCLE_LENGTH_RANGE: (u32, u32) = (15, 45);
pub(crate) const PERIOD_LENGTH_RANGE: (u32, u32) = (1, 10);

// Ingestion limits for stored records. Looser than the prediction ranges so
// long gaps still reach trend analysis as anomalies.
const MAX_RECORDED_CYCLE_LENGTH: u32 = 366;
const MAX_RECORDED_PERIOD_LENGTH: u32 = 31;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FlowLevel {
    None,
    Light,
    Medium,
    Heavy,
}

/// One recorded cycle. `cycle_length` is whatever was attributed to the
/// cycle (possibly a user estimate), not necessarily the gap to the next one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub cycle_length: u32,
    pub period_length: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("cycle starting {0} has a zero cycle length")]
    ZeroCycleLength(NaiveDate),
    #[error("cycle starting {0} has a zero period length")]
    ZeroPeriodLength(NaiveDate),
    #[error("cycle starting {start} has an implausible cycle length of {days} days")]
    CycleLengthTooLong { start: NaiveDate, days: u32 },
    #[error("cycle starting {start} has an implausible period length of {days} days")]
    PeriodLengthTooLong { start: NaiveDate, days: u32 },
    #[error("cycle starting {start} ends before it starts ({end})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl CycleRecord {
    pub fn new(start_date: NaiveDate, cycle_length: u32, period_length: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            cycle_length,
            period_length,
        }
    }

    /// Check the record invariants. Called by the ingestion layer; the
    /// engine itself never rejects input.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.cycle_length == 0 {
            return Err(RecordError::ZeroCycleLength(self.start_date));
        }
        if self.period_length == 0 {
            return Err(RecordError::ZeroPeriodLength(self.start_date));
        }
        if self.cycle_length > MAX_RECORDED_CYCLE_LENGTH {
            return Err(RecordError::CycleLengthTooLong {
                start: self.start_date,
                days: self.cycle_length,
            });
        }
        if self.period_length > MAX_RECORDED_PERIOD_LENGTH {
            return Err(RecordError::PeriodLengthTooLong {
                start: self.start_date,
                days: self.period_length,
            });
        }
        match self.end_date {
            Some(end) if end < self.start_date => Err(RecordError::EndBeforeStart {
                start: self.start_date,
                end,
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub last_period_date: Option<NaiveDate>,
    #[serde(default)]
    pub default_cycle_length: Option<u32>,
    #[serde(default)]
    pub default_period_length: Option<u32>,
}

impl UserProfile {
    /// Default cycle length, clamped to a plausible human range.
    pub fn cycle_length(&self) -> u32 {
        resolve_default(
            "default_cycle_length",
            self.default_cycle_length,
            FALLBACK_CYCLE_LENGTH,
            CYCLE_LENGTH_RANGE,
        )
    }

    /// Default period length, clamped to a plausible human range.
    pub fn period_length(&self) -> u32 {
        resolve_default(
            "default_period_length",
            self.default_period_length,
            FALLBACK_PERIOD_LENGTH,
            PERIOD_LENGTH_RANGE,
        )
    }

    /// Move the anchor date forward to the newest cycle start in `cycles`.
    pub fn with_history(mut self, cycles: &[CycleRecord]) -> Self {
        if let Some(latest) = cycles.iter().map(|c| c.start_date).max() {
            if self.last_period_date.map_or(true, |d| d < latest) {
                self.last_period_date = Some(latest);
            }
        }
        self
    }

    /// Re-anchor on cycles derived from the full flow log. Unlike
    /// [`with_history`](Self::with_history) the anchor may move backwards,
    /// since a corrected log can remove the most recent period.
    pub fn with_derived_history(mut self, cycles: &[CycleRecord]) -> Self {
        if let Some(latest) = cycles.iter().map(|c| c.start_date).max() {
            self.last_period_date = Some(latest);
        }
        self
    }
}

fn resolve_default(field: &str, value: Option<u32>, fallback: u32, range: (u32, u32)) -> u32 {
    match value {
        Some(raw) => clamp_length(field, raw, range),
        None => fallback,
    }
}

/// Clamp a length in days into `range`, warning when it had to move.
pub(crate) fn clamp_length(field: &str, raw: u32, (lo, hi): (u32, u32)) -> u32 {
    let clamped = raw.clamp(lo, hi);
    if clamped != raw {
        tracing::warn!(field, raw, clamped, "length out of range, clamping");
    }
    clamped
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub next_period_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    /// Percentage, always within 10..=95.
    pub confidence: u8,
    pub average_cycle_length: u32,
    pub predicted_period_length: u32,
    /// Standard deviation of cycle lengths, in days.
    pub cycle_variability: f64,
}

impl PredictionResult {
    /// Last expected bleeding day of the predicted period.
    pub fn predicted_period_end(&self) -> Option<NaiveDate> {
        let extra = self.predicted_period_length.saturating_sub(1);
        dates::add_days(self.next_period_date, i64::from(extra))
    }

    pub fn is_fertile_window_active(&self, today: NaiveDate) -> bool {
        dates::is_within_window(self.fertile_window_start, self.fertile_window_end, today)
    }
}

/// A human-readable flag raised by trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Gap between cycle `index` and `index + 1` (1-based) outside 21..=35 days.
    IrregularLength { index: usize, days: i64 },
    LongPeriods { count: usize },
    ExtendedGap { count: usize, longest: i64 },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::IrregularLength { index, days } => {
                write!(f, "Cycle {}→{}: length {} days", index, index + 1, days)
            }
            Anomaly::LongPeriods { count } => write!(
                f,
                "{} cycle{} with a period longer than 7 days",
                count,
                if *count == 1 { "" } else { "s" }
            ),
            Anomaly::ExtendedGap { count, longest } => write!(
                f,
                "{} gap{} of 90+ days between periods (longest {} days)",
                count,
                if *count == 1 { "" } else { "s" },
                longest
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendReport {
    pub cycles_analyzed: usize,
    pub mean_cycle_length: f64,
    pub median_cycle_length: f64,
    pub standard_deviation: f64,
    pub median_absolute_deviation: f64,
    /// Percent.
    pub coefficient_of_variation: f64,
    pub shortest_cycle: i64,
    pub longest_cycle: i64,
    pub average_period_length: f64,
    pub anomalies: Vec<Anomaly>,
    pub symptom_frequency: BTreeMap<String, usize>,
    pub mood_frequency: BTreeMap<String, usize>,
}

/// Mood and symptoms recorded for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayLog {
    pub date: NaiveDate,
    pub flow_level: FlowLevel,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_cycles: usize,
    pub avg_cycle_length: Option<f64>,
    pub avg_period_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub last_period_start: Option<NaiveDate>,
    pub last_period_end: Option<NaiveDate>,
}

/// Everything the tracker persists for one user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerData {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub day_logs: Vec<DayLog>,
    #[serde(default)]
    pub symptom_logs: Vec<SymptomLog>,
    #[serde(default)]
    pub settings: Settings,
    /// Set when the user snoozes the period reminder.
    #[serde(default)]
    pub snoozed_until: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub show_fertility: bool,
    #[serde(default)]
    pub reminders: ReminderSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn validate_rejects_end_before_start() {
        let mut record = CycleRecord::new(date("2024-03-10"), 28, 5);
        record.end_date = Some(date("2024-03-08"));
        assert!(matches!(
            record.validate(),
            Err(RecordError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_lengths() {
        let record = CycleRecord::new(date("2024-03-10"), 0, 5);
        assert_eq!(
            record.validate(),
            Err(RecordError::ZeroCycleLength(date("2024-03-10")))
        );
        let record = CycleRecord::new(date("2024-03-10"), 28, 0);
        assert_eq!(
            record.validate(),
            Err(RecordError::ZeroPeriodLength(date("2024-03-10")))
        );
    }

    #[test]
    fn profile_defaults_fall_back_and_clamp() {
        let profile = UserProfile::default();
        assert_eq!(profile.cycle_length(), 28);
        assert_eq!(profile.period_length(), 5);

        let profile = UserProfile {
            last_period_date: None,
            default_cycle_length: Some(120),
            default_period_length: Some(0),
        };
        assert_eq!(profile.cycle_length(), 45);
        assert_eq!(profile.period_length(), 1);
    }

    #[test]
    fn validate_rejects_implausible_lengths() {
        let record = CycleRecord::new(date("2024-03-10"), 200_000_000, 5);
        assert!(matches!(
            record.validate(),
            Err(RecordError::CycleLengthTooLong { .. })
        ));
        let record = CycleRecord::new(date("2024-03-10"), 28, 60);
        assert!(matches!(
            record.validate(),
            Err(RecordError::PeriodLengthTooLong { .. })
        ));
        // a 120 day gap is unusual but still a real record
        assert!(CycleRecord::new(date("2024-03-10"), 120, 5).validate().is_ok());
    }

    #[test]
    fn derived_history_can_move_anchor_back() {
        let profile = UserProfile {
            last_period_date: Some(date("2024-03-01")),
            ..Default::default()
        };
        let cycles = vec![
            CycleRecord::new(date("2024-01-01"), 28, 5),
            CycleRecord::new(date("2024-01-29"), 28, 5),
        ];
        assert_eq!(
            profile.clone().with_derived_history(&cycles).last_period_date,
            Some(date("2024-01-29"))
        );
        // nothing derived: keep whatever the user set
        assert_eq!(
            profile.with_derived_history(&[]).last_period_date,
            Some(date("2024-03-01"))
        );
    }

    #[test]
    fn predicted_period_end_overflow_is_none() {
        let pred = PredictionResult {
            next_period_date: NaiveDate::MAX,
            ovulation_date: NaiveDate::MAX,
            fertile_window_start: NaiveDate::MAX,
            fertile_window_end: NaiveDate::MAX,
            confidence: 50,
            average_cycle_length: 28,
            predicted_period_length: 5,
            cycle_variability: 0.0,
        };
        assert!(pred.predicted_period_end().is_none());
    }

    #[test]
    fn with_history_only_moves_anchor_forward() {
        let cycles = vec![
            CycleRecord::new(date("2024-01-01"), 28, 5),
            CycleRecord::new(date("2024-01-29"), 28, 5),
        ];
        let profile = UserProfile {
            last_period_date: Some(date("2024-02-20")),
            ..Default::default()
        };
        assert_eq!(
            profile.clone().with_history(&cycles).last_period_date,
            Some(date("2024-02-20"))
        );

        let profile = UserProfile::default().with_history(&cycles);
        assert_eq!(profile.last_period_date, Some(date("2024-01-29")));
    }

    #[test]
    fn tracker_data_fills_missing_fields() {
        let data: TrackerData = serde_json::from_str(
            r#"{"cycles":[{"start_date":"2024-01-01","cycle_length":28,"period_length":5}]}"#,
        )
        .unwrap();
        assert_eq!(data.cycles.len(), 1);
        assert!(data.cycles[0].end_date.is_none());
        assert!(!data.settings.show_fertility);
        assert_eq!(data.settings.reminders, ReminderSettings::default());
        assert_eq!(data.profile, UserProfile::default());
    }

    #[test]
    fn anomaly_lines_are_readable() {
        let gap = Anomaly::IrregularLength { index: 2, days: 10 };
        assert_eq!(gap.to_string(), "Cycle 2→3: length 10 days");
        assert_eq!(
            Anomaly::LongPeriods { count: 1 }.to_string(),
            "1 cycle with a period longer than 7 days"
        );
    }
}
