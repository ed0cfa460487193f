use chrono::NaiveDate;

use crate::dates;
use crate::models::PredictionResult;

/// One-line, user-facing description of when the next period is due.
/// The phrasing is consumed verbatim by front ends.
pub fn format_prediction_summary(result: &PredictionResult, today: NaiveDate) -> String {
    let days = dates::days_until(result.next_period_date, today);
    match days {
        d if d < 0 => format!("Period was expected {} days ago", -d),
        0 => "Period expected today".to_string(),
        1 => "Period expected tomorrow".to_string(),
        d => format!(
            "Period expected in {} days ({})",
            d,
            result.next_period_date.format("%b %-d")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::prediction::predict;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn prediction() -> PredictionResult {
        let profile = UserProfile {
            last_period_date: Some(date("2024-01-01")),
            ..Default::default()
        };
        // next period: 2024-01-29
        predict(&[], &profile, date("2024-01-02")).unwrap()
    }

    #[test]
    fn summary_phrases() {
        let pred = prediction();
        assert_eq!(
            format_prediction_summary(&pred, date("2024-01-28")),
            "Period expected tomorrow"
        );
        assert_eq!(
            format_prediction_summary(&pred, date("2024-01-29")),
            "Period expected today"
        );
        assert_eq!(
            format_prediction_summary(&pred, date("2024-02-01")),
            "Period was expected 3 days ago"
        );
        assert_eq!(
            format_prediction_summary(&pred, date("2024-01-20")),
            "Period expected in 9 days (Jan 29)"
        );
    }
}
