//! Background job scheduler.
//!
//! A single tokio task wakes every `scheduler.tick_seconds`, works out which
//! jobs are due for today and runs them. The last run date of every job is
//! kept in `system_state`, so a restart within the same period never repeats
//! a job.

use crate::{
    config::settings::SchedulerConfig,
    core::{
        auth::purge_expired_sessions,
        carry_over::{format_carry_over_summary, process_all_users_carry_over},
        period::previous_month,
        system_state::{get_date, set_date},
    },
    emails::{
        EmailOutcome, mailer::Mailer, monthly_summary::send_monthly_summaries,
        weekly_reminder::send_weekly_reminders, weekly_summary::send_weekly_summaries,
        yearly_summary::send_yearly_summaries,
    },
    errors::Result,
};
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info};

/// Every scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    /// Close out last month's budgets for every user
    CarryOver,
    /// Nudge inactive users
    WeeklyReminder,
    /// Seven-day summary
    WeeklySummary,
    /// Month summary, on the month's last day
    MonthlySummary,
    /// Year in review, on December 31st
    YearlySummary,
    /// Daily removal of expired login sessions
    SessionCleanup,
}

impl Job {
    /// Jobs in the order they run within a tick.
    pub const ALL: [Self; 6] = [
        Self::CarryOver,
        Self::WeeklyReminder,
        Self::WeeklySummary,
        Self::MonthlySummary,
        Self::YearlySummary,
        Self::SessionCleanup,
    ];

    /// `system_state` key holding the last run date.
    #[must_use]
    pub const fn state_key(self) -> &'static str {
        match self {
            Self::CarryOver => "job_last_run:carry_over",
            Self::WeeklyReminder => "job_last_run:weekly_reminder",
            Self::WeeklySummary => "job_last_run:weekly_summary",
            Self::MonthlySummary => "job_last_run:monthly_summary",
            Self::YearlySummary => "job_last_run:yearly_summary",
            Self::SessionCleanup => "job_last_run:session_cleanup",
        }
    }

    /// Whether the job should run on `today` given when it last ran.
    ///
    /// The carry-over runs once per calendar month, from its first day on, so
    /// a server that was down on the 1st catches up. Emails only go out on
    /// their trigger day.
    #[must_use]
    pub fn is_due(
        self,
        today: NaiveDate,
        last_run: Option<NaiveDate>,
        weekly_day: Weekday,
    ) -> bool {
        if last_run == Some(today) {
            return false;
        }
        match self {
            Self::CarryOver => {
                last_run.is_none_or(|last| {
                    (last.year(), last.month()) != (today.year(), today.month())
                })
            }
            Self::WeeklyReminder | Self::WeeklySummary => today.weekday() == weekly_day,
            Self::MonthlySummary => is_last_day_of_month(today),
            Self::YearlySummary => today.month() == 12 && today.day() == 31,
            Self::SessionCleanup => true,
        }
    }
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.checked_add_days(Days::new(1))
        .is_some_and(|next| next.month() != date.month())
}

/// What a job did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobReport {
    /// Counters of an email job
    Emails(EmailOutcome),
    /// Users whose budgets were carried over
    CarryOver {
        /// Users processed
        users: usize,
    },
    /// Expired sessions deleted
    Sessions {
        /// Rows removed
        removed: u64,
    },
}

/// Runs a single job for `today`.
pub async fn run_job(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    job: Job,
    today: NaiveDate,
) -> Result<JobReport> {
    match job {
        Job::CarryOver => {
            let (year, month) = previous_month(today.year(), today.month());
            let results = process_all_users_carry_over(db, year, month).await?;
            for (user_id, result) in &results {
                debug!(user_id, "{}", format_carry_over_summary(year, month, result));
            }
            Ok(JobReport::CarryOver { users: results.len() })
        }
        Job::WeeklyReminder => {
            send_weekly_reminders(db, mailer, today).await.map(JobReport::Emails)
        }
        Job::WeeklySummary => {
            send_weekly_summaries(db, mailer, today).await.map(JobReport::Emails)
        }
        Job::MonthlySummary => {
            send_monthly_summaries(db, mailer, today).await.map(JobReport::Emails)
        }
        Job::YearlySummary => {
            send_yearly_summaries(db, mailer, today).await.map(JobReport::Emails)
        }
        Job::SessionCleanup => {
            let removed = purge_expired_sessions(db, Utc::now()).await?;
            Ok(JobReport::Sessions { removed })
        }
    }
}

/// Runs every job due on `today` and records its run date.
///
/// A failing job is logged and left unrecorded so the next tick retries it.
pub async fn run_due_jobs(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    weekly_day: Weekday,
    today: NaiveDate,
) -> Result<Vec<(Job, JobReport)>> {
    let mut reports = Vec::new();
    for job in Job::ALL {
        let last_run = get_date(db, job.state_key()).await?;
        if !job.is_due(today, last_run, weekly_day) {
            continue;
        }

        match run_job(db, mailer, job, today).await {
            Ok(report) => {
                set_date(db, job.state_key(), today).await?;
                info!(?job, ?report, "Scheduled job finished");
                reports.push((job, report));
            }
            Err(e) => error!(?job, error = %e, "Scheduled job failed"),
        }
    }
    Ok(reports)
}

/// Ticks forever, running due jobs. Spawn this on its own task.
pub async fn run_scheduler(
    db: DatabaseConnection,
    mailer: Arc<dyn Mailer>,
    config: SchedulerConfig,
) -> Result<()> {
    let weekly_day = config.weekly_weekday()?;
    let mut interval = tokio::time::interval(Duration::from_secs(config.tick_seconds.max(1)));
    info!(tick_seconds = config.tick_seconds, %weekly_day, "Scheduler started");

    loop {
        interval.tick().await;
        let today = Utc::now().date_naive();
        if let Err(e) = run_due_jobs(&db, mailer.as_ref(), weekly_day, today).await {
            error!(error = %e, "Scheduler tick failed");
        }
    }
}
