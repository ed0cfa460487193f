//! On-device cycle prediction and statistics.
//!
//! The engine is a set of pure functions over in-memory history: [`predict`]
//! extrapolates the next period and fertile window, [`analyze_trends`]
//! summarises cycle variability and flags anomalies. Every date-relative
//! computation takes "today" as a parameter.

pub mod cycles;
pub mod dates;
pub mod models;
pub mod prediction;
pub mod reminders;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod trends;
pub mod vault;

pub use cycles::derive_cycles;
pub use dates::{days_until, is_within_window};
pub use models::{
    Anomaly, CycleRecord, CycleStats, DayLog, FlowLevel, PredictionResult, Settings, SymptomLog,
    TrackerData, TrendReport, UserProfile,
};
pub use prediction::{cycle_stats, predict, score_confidence};
pub use reminders::ReminderSettings;
pub use summary::format_prediction_summary;
pub use trends::analyze_trends;
