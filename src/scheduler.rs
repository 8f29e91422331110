// src/scheduler.rs
//! Weekly digest trigger: every Sunday 22:00 UTC, summarize the last six days.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use metrics::gauge;
use tokio::task::JoinHandle;

use crate::history::{RunHistory, RunTrigger};
use crate::pipeline::Agent;

pub const SCHEDULE_WEEKDAY: Weekday = Weekday::Sun;
pub const SCHEDULE_HOUR_UTC: u32 = 22;
pub const SCHEDULED_DAYS_BACK: u32 = 6;

/// First `weekday` at `hour`:00 UTC strictly after `now`.
pub fn next_weekly_run(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date_naive();
    let days_ahead = (i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
    .rem_euclid(7);
    let candidate = (today + Duration::days(days_ahead)).and_time(at).and_utc();
    if candidate > now {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}

/// Sleep until the next slot, run, record, repeat. Never returns.
pub fn spawn_weekly_scheduler(agent: Arc<Agent>, history: Arc<RunHistory>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_weekly_run(now, SCHEDULE_WEEKDAY, SCHEDULE_HOUR_UTC);
            gauge!("agent_next_scheduled_run_ts").set(next.timestamp() as f64);
            tracing::info!(target: "scheduler", next = %next, "weekly digest scheduled");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let result = agent.run(SCHEDULED_DAYS_BACK).await;
            history.record(RunTrigger::Scheduled, SCHEDULED_DAYS_BACK, &result);
            tracing::info!(
                target: "scheduler",
                success = result.success,
                stage = ?result.stage,
                content_chars = result.content.chars().count(),
                "weekly digest finished"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn midweek_rolls_forward_to_sunday() {
        // Wednesday
        let now = Utc.with_ymd_and_hms(2025, 10, 15, 9, 30, 0).unwrap();
        let next = next_weekly_run(now, Weekday::Sun, 22);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 19, 22, 0, 0).unwrap());
    }

    #[test]
    fn exact_slot_moves_a_full_week() {
        let now = Utc.with_ymd_and_hms(2025, 10, 19, 22, 0, 0).unwrap();
        let next = next_weekly_run(now, Weekday::Sun, 22);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 26, 22, 0, 0).unwrap());
    }

    #[test]
    fn sunday_before_the_hour_runs_same_day() {
        let now = Utc.with_ymd_and_hms(2025, 10, 19, 21, 59, 59).unwrap();
        let next = next_weekly_run(now, Weekday::Sun, 22);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 19, 22, 0, 0).unwrap());
    }
}
