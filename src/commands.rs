use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use cykel_engine::models::{DayLog, FlowLevel, SymptomLog, TrackerData};
use cykel_engine::{reminders, storage};
use cykel_engine::{
    analyze_trends, cycle_stats, derive_cycles, format_prediction_summary, predict,
};

/// Period prediction and cycle statistics, computed on-device.
#[derive(Parser)]
#[command(name = "cykel", author, version, about, long_about = None)]
pub struct Cli {
    /// Tracker data file. Defaults to the platform data directory.
    #[arg(long, env = "CYKEL_DATA", global = true)]
    data: Option<PathBuf>,

    /// Passphrase for an encrypted data file.
    #[arg(long, env = "CYKEL_PASSPHRASE", hide_env_values = true, global = true)]
    passphrase: Option<String>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of the local date.
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict the next period and fertile window.
    Predict,
    /// Cycle variability, anomalies and symptom frequencies.
    Trends,
    /// Summary statistics over the recorded cycles.
    Stats,
    /// Decide whether a period reminder is due.
    Remind(RemindArgs),
    /// Log flow, mood and symptoms for a day and rebuild cycles.
    Log(LogArgs),
    /// Set the anchor date and default lengths.
    Profile(ProfileArgs),
    /// Change display and reminder settings.
    Configure(ConfigureArgs),
    /// Dump all tracker data as JSON.
    Export,
}

#[derive(Args)]
struct RemindArgs {
    /// Evaluate at this moment (YYYY-MM-DDTHH:MM:SS).
    #[arg(long)]
    now: Option<NaiveDateTime>,
    /// Snooze the reminder for the configured duration.
    #[arg(long)]
    snooze: bool,
}

#[derive(Args)]
struct LogArgs {
    #[arg(long)]
    date: NaiveDate,
    #[arg(long, value_enum, default_value_t = Flow::None)]
    flow: Flow,
    #[arg(long, default_value = "")]
    mood: String,
    /// Repeat for several symptoms.
    #[arg(long = "symptom")]
    symptoms: Vec<String>,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    last_period: Option<NaiveDate>,
    #[arg(long)]
    cycle_length: Option<u32>,
    #[arg(long)]
    period_length: Option<u32>,
}

#[derive(Args)]
struct ConfigureArgs {
    #[arg(long)]
    show_fertility: Option<bool>,
    #[arg(long)]
    reminders: Option<bool>,
    #[arg(long)]
    days_before: Option<u32>,
    #[arg(long)]
    snooze_hours: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Flow {
    None,
    Light,
    Medium,
    Heavy,
}

impl From<Flow> for FlowLevel {
    fn from(flow: Flow) -> Self {
        match flow {
            Flow::None => FlowLevel::None,
            Flow::Light => FlowLevel::Light,
            Flow::Medium => FlowLevel::Medium,
            Flow::Heavy => FlowLevel::Heavy,
        }
    }
}

/// Loaded data plus everything needed to write it back.
struct Session {
    path: PathBuf,
    passphrase: Option<String>,
    pinned_today: Option<NaiveDate>,
    today: NaiveDate,
    json: bool,
    data: TrackerData,
}

impl Session {
    fn open(cli: &Cli, create: bool) -> Result<Self> {
        let path = match &cli.data {
            Some(path) => path.clone(),
            None => storage::default_data_path()?,
        };
        let data = if create && !path.exists() {
            tracing::info!(path = %path.display(), "starting a new tracker file");
            TrackerData::default()
        } else {
            storage::load(&path, cli.passphrase.as_deref())
                .with_context(|| format!("failed to load {}", path.display()))?
        };
        Ok(Self {
            path,
            passphrase: cli.passphrase.clone(),
            pinned_today: cli.today,
            today: cli.today.unwrap_or_else(|| Local::now().date_naive()),
            json: cli.json,
            data,
        })
    }

    fn save(&self) -> Result<()> {
        storage::save(&self.path, &self.data, self.passphrase.as_deref())
            .with_context(|| format!("failed to save {}", self.path.display()))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let create = matches!(
        cli.command,
        Command::Log(_) | Command::Profile(_) | Command::Configure(_)
    );
    let mut session = Session::open(&cli, create)?;

    match cli.command {
        Command::Predict => cmd_predict(&session),
        Command::Trends => cmd_trends(&session),
        Command::Stats => cmd_stats(&session),
        Command::Remind(args) => cmd_remind(&mut session, args),
        Command::Log(args) => cmd_log(&mut session, args),
        Command::Profile(args) => cmd_profile(&mut session, args),
        Command::Configure(args) => cmd_configure(&mut session, args),
        Command::Export => {
            println!("{}", serde_json::to_string_pretty(&session.data)?);
            Ok(())
        }
    }
}

fn cmd_predict(session: &Session) -> Result<()> {
    let data = &session.data;
    let Some(prediction) = predict(&data.cycles, &data.profile, session.today) else {
        println!("No prediction available: set a last period date first.");
        return Ok(());
    };

    session.emit(&prediction, || {
        let mut lines = vec![
            format_prediction_summary(&prediction, session.today),
            match prediction.predicted_period_end() {
                Some(end) => format!(
                    "Next period: {} to {} ({}% confidence)",
                    prediction.next_period_date, end, prediction.confidence
                ),
                None => format!(
                    "Next period: {} ({}% confidence)",
                    prediction.next_period_date, prediction.confidence
                ),
            },
            format!(
                "Average cycle: {} days (±{:.1})",
                prediction.average_cycle_length, prediction.cycle_variability
            ),
        ];
        if data.settings.show_fertility {
            lines.push(format!(
                "Fertile window: {} to {}, ovulation around {}{}",
                prediction.fertile_window_start,
                prediction.fertile_window_end,
                prediction.ovulation_date,
                if prediction.is_fertile_window_active(session.today) {
                    " (active now)"
                } else {
                    ""
                }
            ));
        }
        lines.join("\n")
    })
}

fn cmd_trends(session: &Session) -> Result<()> {
    let data = &session.data;
    let Some(report) = analyze_trends(&data.cycles, &data.symptom_logs) else {
        println!(
            "Not enough history for trends: {} of {} cycles recorded.",
            data.cycles.len(),
            cykel_engine::trends::MIN_CYCLES_FOR_TRENDS
        );
        return Ok(());
    };

    session.emit(&report, || {
        let mut lines = vec![
            format!("Cycles analysed: {}", report.cycles_analyzed),
            format!(
                "Cycle length: mean {:.1}, median {:.1}, range {}-{} days",
                report.mean_cycle_length,
                report.median_cycle_length,
                report.shortest_cycle,
                report.longest_cycle
            ),
            format!(
                "Variability: sd {:.1} days, MAD {:.1} days, CV {:.1}%",
                report.standard_deviation,
                report.median_absolute_deviation,
                report.coefficient_of_variation
            ),
        ];
        if report.anomalies.is_empty() {
            lines.push("No anomalies".to_string());
        } else {
            lines.push("Anomalies:".to_string());
            lines.extend(report.anomalies.iter().map(|a| format!("  - {a}")));
        }
        for (title, table) in [
            ("Symptoms", &report.symptom_frequency),
            ("Moods", &report.mood_frequency),
        ] {
            if !table.is_empty() {
                lines.push(format!("{title}:"));
                lines.extend(table.iter().map(|(label, n)| format!("  {label}: {n}")));
            }
        }
        lines.join("\n")
    })
}

fn cmd_stats(session: &Session) -> Result<()> {
    let stats = cycle_stats(&session.data.cycles);
    session.emit(&stats, || {
        let fmt_days = |v: Option<f64>| v.map_or("-".to_string(), |d| format!("{d:.1} days"));
        let fmt_opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        [
            format!("Cycles recorded: {}", stats.total_cycles),
            format!("Average cycle: {}", fmt_days(stats.avg_cycle_length)),
            format!("Average period: {}", fmt_days(stats.avg_period_length)),
            format!(
                "Shortest / longest: {} / {}",
                fmt_opt(stats.shortest_cycle.map(|d| d.to_string())),
                fmt_opt(stats.longest_cycle.map(|d| d.to_string()))
            ),
            format!(
                "Last period: {} to {}",
                fmt_opt(stats.last_period_start.map(|d| d.to_string())),
                fmt_opt(stats.last_period_end.map(|d| d.to_string()))
            ),
        ]
        .join("\n")
    })
}

#[derive(Serialize)]
struct ReminderStatus {
    due: bool,
    reminder_date: Option<NaiveDate>,
    snoozed_until: Option<NaiveDateTime>,
}

fn cmd_remind(session: &mut Session, args: RemindArgs) -> Result<()> {
    let now = args
        .now
        .or_else(|| session.pinned_today.map(|d| d.and_time(NaiveTime::MIN)))
        .unwrap_or_else(|| Local::now().naive_local());

    let settings = session.data.settings.reminders.clone();
    let Some(prediction) = predict(&session.data.cycles, &session.data.profile, now.date()) else {
        println!("No prediction available: set a last period date first.");
        return Ok(());
    };

    if args.snooze {
        let until = reminders::snooze_until(&settings, now)
            .context("snooze would end outside the supported date range")?;
        session.data.snoozed_until = Some(until);
        session.save()?;
        tracing::info!(%until, "reminder snoozed");
    }

    let status = ReminderStatus {
        due: reminders::should_remind(&prediction, &settings, session.data.snoozed_until, now),
        reminder_date: reminders::reminder_date(&prediction, &settings),
        snoozed_until: session.data.snoozed_until.filter(|until| now < *until),
    };

    session.emit(&status, || {
        if status.due {
            format_prediction_summary(&prediction, now.date())
        } else if let Some(until) = status.snoozed_until {
            format!("Reminder snoozed until {until}")
        } else if let Some(date) = status.reminder_date {
            format!("No reminder due (next on {date})")
        } else {
            "Reminders are off".to_string()
        }
    })
}

fn cmd_log(session: &mut Session, args: LogArgs) -> Result<()> {
    let data = &mut session.data;
    let flow_level = FlowLevel::from(args.flow);

    if let Some(existing) = data.day_logs.iter_mut().find(|l| l.date == args.date) {
        existing.flow_level = flow_level;
        existing.notes = args.notes;
    } else {
        data.day_logs.push(DayLog {
            date: args.date,
            flow_level,
            notes: args.notes,
        });
    }

    data.symptom_logs.retain(|l| l.date != args.date);
    if !args.mood.is_empty() || !args.symptoms.is_empty() {
        data.symptom_logs.push(SymptomLog {
            date: args.date,
            mood: args.mood,
            symptoms: args.symptoms,
        });
    }

    data.cycles = derive_cycles(&data.day_logs, data.profile.cycle_length(), session.today);
    data.profile = std::mem::take(&mut data.profile).with_derived_history(&data.cycles);

    session.save()?;
    println!("Logged {} ({} cycles on record)", args.date, session.data.cycles.len());
    Ok(())
}

fn cmd_profile(session: &mut Session, args: ProfileArgs) -> Result<()> {
    let profile = &mut session.data.profile;
    if let Some(date) = args.last_period {
        profile.last_period_date = Some(date);
    }
    if let Some(days) = args.cycle_length {
        profile.default_cycle_length = Some(days);
    }
    if let Some(days) = args.period_length {
        profile.default_period_length = Some(days);
    }
    session.save()?;
    session.emit(&session.data.profile, || "Profile updated".to_string())
}

fn cmd_configure(session: &mut Session, args: ConfigureArgs) -> Result<()> {
    let settings = &mut session.data.settings;
    if let Some(show) = args.show_fertility {
        settings.show_fertility = show;
    }
    if let Some(enabled) = args.reminders {
        settings.reminders.enabled = enabled;
    }
    if let Some(days) = args.days_before {
        settings.reminders.days_before = days;
    }
    if let Some(hours) = args.snooze_hours {
        settings.reminders.snooze_duration_hours = hours;
    }
    settings.reminders = std::mem::take(&mut settings.reminders).clamped();
    session.save()?;
    session.emit(&session.data.settings, || "Settings updated".to_string())
}
