use chrono::NaiveDate;

use crate::dates;
use crate::models::{CycleRecord, DayLog, FlowLevel};

/// Flow days at most this far apart belong to the same period.
const MAX_FLOW_GAP_DAYS: i64 = 2;

/// Rebuild cycle records from daily flow logs.
///
/// Each run of flow days becomes one cycle. Its `cycle_length` is the gap to
/// the next period start; the most recent cycle gets `default_cycle_length`.
/// The latest period stays open while its last flow day is recent.
pub fn derive_cycles(
    day_logs: &[DayLog],
    default_cycle_length: u32,
    today: NaiveDate,
) -> Vec<CycleRecord> {
    let mut flow_days: Vec<NaiveDate> = day_logs
        .iter()
        .filter(|l| l.flow_level != FlowLevel::None)
        .map(|l| l.date)
        .collect();
    flow_days.sort();
    flow_days.dedup();

    let Some((&first, rest)) = flow_days.split_first() else {
        return Vec::new();
    };

    let mut periods: Vec<(NaiveDate, NaiveDate)> = Vec::new();
    let (mut start, mut end) = (first, first);
    for &day in rest {
        if dates::days_between(end, day) <= MAX_FLOW_GAP_DAYS {
            end = day;
        } else {
            periods.push((start, end));
            start = day;
            end = day;
        }
    }
    periods.push((start, end));

    let mut cycles: Vec<CycleRecord> = periods
        .iter()
        .zip(periods.iter().skip(1).map(Some).chain(std::iter::once(None)))
        .map(|(&(start, end), next)| {
            let cycle_length = match next {
                Some(&(next_start, _)) => dates::days_between(start, next_start) as u32,
                None => default_cycle_length,
            };
            let mut record = CycleRecord::new(
                start,
                cycle_length,
                dates::days_between(start, end) as u32 + 1,
            );
            record.end_date = Some(end);
            record
        })
        .collect();

    if let Some(last) = cycles.last_mut() {
        if let Some(end) = last.end_date {
            if dates::days_between(end, today) <= MAX_FLOW_GAP_DAYS {
                last.end_date = None;
            }
        }
    }

    tracing::debug!(cycles = cycles.len(), "cycles rebuilt from day logs");
    cycles
}
