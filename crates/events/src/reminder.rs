//! Due-date reminder scheduler.
//!
//! [`ReminderScheduler`] runs as a background task. Each pass it:
//!
//! 1. finds assigned, unfinished tasks due 24 to 48 hours from now and writes
//!    one "Task Due Soon" notification per task (plus an email when SMTP is
//!    configured);
//! 2. finds assigned, unfinished tasks already past due and writes one
//!    "Task Overdue" notification per task.
//!
//! Tasks are stamped after notifying so each reminder is sent at most once
//! per due date.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use projecthub_core::notification;
use projecthub_core::types::{DbId, Timestamp};
use projecthub_db::models::notification::{CreateNotification, Notification};
use projecthub_db::models::task::ReminderCandidate;
use projecthub_db::repositories::{NotificationRepo, TaskRepo};
use projecthub_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::delivery::email::EmailDelivery;

/// Default time between passes.
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(3600);

/// Start of the due-soon window, in hours from now.
const DUE_SOON_FROM_HOURS: i64 = 24;
/// End of the due-soon window, in hours from now.
const DUE_SOON_TO_HOURS: i64 = 48;

/// Receives notifications right after they are written, e.g. to push them
/// to live connections.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notifications: &[Notification]);
}

/// What a single pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReminderReport {
    pub due_soon: usize,
    pub overdue: usize,
    pub emails_sent: usize,
}

// ---------------------------------------------------------------------------
// ReminderScheduler
// ---------------------------------------------------------------------------

/// Background service that sends due-date reminders on a periodic basis.
pub struct ReminderScheduler {
    pool: DbPool,
    interval: Duration,
    email: Option<EmailDelivery>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl ReminderScheduler {
    /// Create a new scheduler with the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            interval: DEFAULT_REMINDER_INTERVAL,
            email: None,
            sink: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Also email due-soon reminders to assignees.
    pub fn with_email(mut self, email: EmailDelivery) -> Self {
        self.email = Some(email);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the scheduler loop.
    ///
    /// The first pass runs immediately. The loop exits gracefully when the
    /// provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            email_enabled = self.email.is_some(),
            "Reminder scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    match self.process(Utc::now()).await {
                        Ok(report) if report != ReminderReport::default() => {
                            tracing::info!(
                                due_soon = report.due_soon,
                                overdue = report.overdue,
                                emails_sent = report.emails_sent,
                                "Processed task reminders"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Failed to process task reminders"),
                    }
                }
            }
        }
    }

    /// Run a single pass as of `now`.
    pub async fn process(&self, now: Timestamp) -> Result<ReminderReport, sqlx::Error> {
        let mut report = ReminderReport::default();

        let due_soon = TaskRepo::due_for_reminder(
            &self.pool,
            now + ChronoDuration::hours(DUE_SOON_FROM_HOURS),
            now + ChronoDuration::hours(DUE_SOON_TO_HOURS),
        )
        .await?;
        if !due_soon.is_empty() {
            let drafts = due_soon
                .iter()
                .map(|c| {
                    let draft =
                        notification::task_due_soon(c.task_id, &c.task_name, &format_due(c));
                    CreateNotification::from_draft(c.assignee_id, &draft)
                })
                .collect::<Vec<_>>();
            self.write(&drafts).await?;
            TaskRepo::mark_reminder_sent(&self.pool, &task_ids(&due_soon)).await?;
            report.due_soon = due_soon.len();
            report.emails_sent = self.email_reminders(&due_soon).await;
        }

        let overdue = TaskRepo::overdue_unnotified(&self.pool, now).await?;
        if !overdue.is_empty() {
            let drafts = overdue
                .iter()
                .map(|c| {
                    let draft =
                        notification::task_overdue(c.task_id, &c.task_name, &format_due(c));
                    CreateNotification::from_draft(c.assignee_id, &draft)
                })
                .collect::<Vec<_>>();
            self.write(&drafts).await?;
            TaskRepo::mark_overdue_notified(&self.pool, &task_ids(&overdue)).await?;
            report.overdue = overdue.len();
        }

        Ok(report)
    }

    async fn write(&self, inputs: &[CreateNotification]) -> Result<(), sqlx::Error> {
        let rows = NotificationRepo::create_bulk(&self.pool, inputs).await?;
        if let Some(sink) = &self.sink {
            sink.notify(&rows);
        }
        Ok(())
    }

    /// Email each candidate. Failures are logged and skipped.
    async fn email_reminders(&self, candidates: &[ReminderCandidate]) -> usize {
        let Some(email) = &self.email else {
            return 0;
        };

        let mut sent = 0;
        for c in candidates {
            match email
                .send_task_reminder(&c.assignee_email, &c.assignee_name, &c.task_name, &format_due(c))
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!(
                    task_id = c.task_id,
                    user_id = c.assignee_id,
                    error = %e,
                    "Failed to email task reminder"
                ),
            }
        }
        sent
    }
}

fn format_due(candidate: &ReminderCandidate) -> String {
    candidate.due_date.format("%Y-%m-%d").to_string()
}

fn task_ids(candidates: &[ReminderCandidate]) -> Vec<DbId> {
    candidates.iter().map(|c| c.task_id).collect()
}
