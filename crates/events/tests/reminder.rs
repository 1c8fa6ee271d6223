use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use projecthub_db::models::notification::Notification;
use projecthub_db::models::project::CreateProject;
use projecthub_db::models::task::CreateTask;
use projecthub_db::models::user::{CreateUser, User};
use projecthub_db::repositories::{NotificationRepo, ProjectRepo, TaskRepo, UserRepo};
use projecthub_events::{NotificationSink, ReminderReport, ReminderScheduler};
use sqlx::PgPool;

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notifications: &[Notification]) {
        self.seen.lock().unwrap().extend_from_slice(notifications);
    }
}

async fn seed_user(pool: &PgPool, name: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            password_hash: "h".into(),
            full_name: format!("{name} Tester"),
            role: "Employee".into(),
            major: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_task(
    pool: &PgPool,
    project_id: i64,
    creator: i64,
    name: &str,
    assignee: Option<i64>,
    due_in_hours: i64,
    status: Option<&str>,
) -> i64 {
    TaskRepo::create(
        pool,
        creator,
        &CreateTask {
            project_id,
            name: name.into(),
            assigned_to_id: assignee,
            due_date: Some(Utc::now() + Duration::hours(due_in_hours)),
            status: status.map(str::to_string),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reminders_sent_once(pool: PgPool) {
    let user = seed_user(&pool, "ada").await;
    let project = ProjectRepo::create(
        &pool,
        user.id,
        &CreateProject {
            name: "Launch".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let soon = seed_task(&pool, project.id, user.id, "Soon", Some(user.id), 30, None).await;
    seed_task(&pool, project.id, user.id, "Far", Some(user.id), 100, None).await;
    seed_task(&pool, project.id, user.id, "Finished", Some(user.id), 30, Some("Done")).await;
    seed_task(&pool, project.id, user.id, "Nobody", None, 30, None).await;
    let late = seed_task(&pool, project.id, user.id, "Late", Some(user.id), -5, None).await;

    let sink = Arc::new(RecordingSink::default());
    let scheduler = ReminderScheduler::new(pool.clone()).with_sink(sink.clone());

    let report = scheduler.process(Utc::now()).await.unwrap();
    assert_eq!(
        report,
        ReminderReport {
            due_soon: 1,
            overdue: 1,
            emails_sent: 0
        }
    );

    let rows = NotificationRepo::list_for_user(&pool, user.id, false, 20, 0)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|n| n.kind == "due_date_reminder"));
    let titles: Vec<&str> = rows.iter().map(|n| n.title.as_str()).collect();
    assert!(titles.contains(&"Task Due Soon"));
    assert!(titles.contains(&"Task Overdue"));
    let related: Vec<Option<i64>> = rows.iter().map(|n| n.related_entity_id).collect();
    assert!(related.contains(&Some(soon)));
    assert!(related.contains(&Some(late)));

    assert_eq!(sink.seen.lock().unwrap().len(), 2);

    // A second pass finds nothing new.
    let again = scheduler.process(Utc::now()).await.unwrap();
    assert_eq!(again, ReminderReport::default());
    assert_eq!(NotificationRepo::unread_count(&pool, user.id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archived_projects_are_skipped(pool: PgPool) {
    let user = seed_user(&pool, "ada").await;
    let project = ProjectRepo::create(
        &pool,
        user.id,
        &CreateProject {
            name: "Old".into(),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    seed_task(&pool, project.id, user.id, "Late", Some(user.id), -5, None).await;
    ProjectRepo::archive(&pool, project.id).await.unwrap();

    let report = ReminderScheduler::new(pool.clone())
        .process(Utc::now())
        .await
        .unwrap();
    assert_eq!(report, ReminderReport::default());
}
