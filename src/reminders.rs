//! When to remind the user about an upcoming period. Delivery is up to the
//! caller; this module only decides.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::models::PredictionResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub days_before: u32,
    pub snooze_duration_hours: u32,
}

/// Longest lead time offered for a reminder.
pub const MAX_DAYS_BEFORE: u32 = 14;
/// Snooze bounds, in hours.
pub const SNOOZE_HOURS_RANGE: (u32, u32) = (1, 168);

impl ReminderSettings {
    /// Settings pulled back into the supported ranges. Applied to anything
    /// read from disk or typed on the command line.
    pub fn clamped(self) -> Self {
        let (lo, hi) = SNOOZE_HOURS_RANGE;
        let clamped = Self {
            enabled: self.enabled,
            days_before: self.days_before.min(MAX_DAYS_BEFORE),
            snooze_duration_hours: self.snooze_duration_hours.clamp(lo, hi),
        };
        if clamped != self {
            tracing::warn!(
                days_before = self.days_before,
                snooze_duration_hours = self.snooze_duration_hours,
                "reminder settings out of range, clamping"
            );
        }
        clamped
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days_before: 2,
            snooze_duration_hours: 24,
        }
    }
}

/// Day the reminder becomes due, or `None` when reminders are off or the
/// lead time runs off the calendar.
pub fn reminder_date(
    prediction: &PredictionResult,
    settings: &ReminderSettings,
) -> Option<NaiveDate> {
    if !settings.enabled {
        return None;
    }
    dates::add_days(
        prediction.next_period_date,
        -i64::from(settings.days_before),
    )
}

/// End of a snooze started at `now`; `None` if it would leave the calendar.
pub fn snooze_until(settings: &ReminderSettings, now: NaiveDateTime) -> Option<NaiveDateTime> {
    now.checked_add_signed(Duration::try_hours(i64::from(
        settings.snooze_duration_hours,
    ))?)
}

/// Whether a reminder should be shown at `now`: reminders are on, any snooze
/// has expired, and today lies between the reminder day and the predicted
/// period start.
pub fn should_remind(
    prediction: &PredictionResult,
    settings: &ReminderSettings,
    snoozed_until: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> bool {
    let Some(due) = reminder_date(prediction, settings) else {
        return false;
    };
    if snoozed_until.is_some_and(|until| now < until) {
        return false;
    }
    dates::is_within_window(due, prediction.next_period_date, now.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use crate::prediction::predict;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
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
    fn reminder_is_due_days_before_period() {
        let settings = ReminderSettings {
            days_before: 3,
            ..Default::default()
        };
        assert_eq!(reminder_date(&prediction(), &settings), Some(date("2024-01-26")));
    }

    #[test]
    fn disabled_reminders_never_fire() {
        let settings = ReminderSettings {
            enabled: false,
            ..Default::default()
        };
        assert!(reminder_date(&prediction(), &settings).is_none());
        assert!(!should_remind(&prediction(), &settings, None, at("2024-01-28 09:00")));
    }

    #[test]
    fn reminds_only_inside_the_lead_up() {
        let settings = ReminderSettings::default();
        let pred = prediction();
        assert!(!should_remind(&pred, &settings, None, at("2024-01-26 09:00")));
        assert!(should_remind(&pred, &settings, None, at("2024-01-27 09:00")));
        assert!(should_remind(&pred, &settings, None, at("2024-01-29 23:59")));
        assert!(!should_remind(&pred, &settings, None, at("2024-01-30 00:00")));
    }

    #[test]
    fn snooze_suppresses_until_it_expires() {
        let settings = ReminderSettings {
            snooze_duration_hours: 12,
            ..Default::default()
        };
        let pred = prediction();
        let until = snooze_until(&settings, at("2024-01-27 08:00")).unwrap();
        assert_eq!(until, at("2024-01-27 20:00"));
        assert!(!should_remind(&pred, &settings, Some(until), at("2024-01-27 19:59")));
        assert!(should_remind(&pred, &settings, Some(until), at("2024-01-27 20:00")));
    }

    #[test]
    fn huge_settings_do_not_panic() {
        let settings = ReminderSettings {
            enabled: true,
            days_before: u32::MAX,
            snooze_duration_hours: u32::MAX,
        };
        let pred = prediction();
        // both offsets run past the representable calendar
        assert!(reminder_date(&pred, &settings).is_none());
        assert!(snooze_until(&settings, at("2024-01-27 08:00")).is_none());
        assert!(!should_remind(&pred, &settings, None, at("2024-01-28 09:00")));

        let clamped = settings.clamped();
        assert_eq!(reminder_date(&pred, &clamped), Some(date("2024-01-15")));
        assert_eq!(
            snooze_until(&clamped, at("2024-01-27 08:00")),
            Some(at("2024-02-03 08:00"))
        );
        assert!(snooze_until(&clamped, NaiveDateTime::MAX).is_none());
    }

    #[test]
    fn clamped_pulls_settings_into_range() {
        let settings = ReminderSettings {
            enabled: false,
            days_before: 1_000_000,
            snooze_duration_hours: 0,
        }
        .clamped();
        assert_eq!(
            settings,
            ReminderSettings {
                enabled: false,
                days_before: 14,
                snooze_duration_hours: 1,
            }
        );

        let in_range = ReminderSettings::default();
        assert_eq!(in_range.clone().clamped(), in_range);
        let huge = ReminderSettings {
            snooze_duration_hours: u32::MAX,
            ..Default::default()
        };
        assert_eq!(huge.clamped().snooze_duration_hours, 168);
    }
}
