//! The daily trigger.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use chrono::{NaiveTime, Utc};
use internhub_core::{StudentId, Time};
use internhub_lifecycle::ReportLifecycleManager;
use internhub_notify::Notifier;
use internhub_storage::Storage;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::clock::next_fire_after;

/// Configuration for the daily scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// UTC wall-clock time of the daily tick
    pub fire_at: NaiveTime,
    /// Run one tick immediately when the loop starts
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fire_at: NaiveTime::MIN,
            run_on_start: false,
        }
    }
}

impl SchedulerConfig {
    /// Set the daily fire time.
    pub fn with_fire_at(mut self, fire_at: NaiveTime) -> Self {
        self.fire_at = fire_at;
        self
    }

    /// Tick once at startup.
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }
}

/// A failure that was logged and skipped during a tick.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickFailure {
    /// Student being processed, if the failure was per student
    pub student: Option<StudentId>,
    /// Error text
    pub error: String,
}

/// What one tick did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Instant the tick ran for
    pub ran_at: Time,
    /// Active students found
    pub students_scanned: usize,
    /// Reports generated across all students
    pub reports_created: usize,
    /// Reports moved to OVERDUE
    pub overdue_marked: usize,
    /// Failures that did not stop the tick
    pub failures: Vec<TickFailure>,
}

/// Result of asking for a tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// The tick ran
    Completed(TickReport),
    /// Another tick was still running
    Skipped,
}

/// Runs due-report generation and the overdue sweep once a day.
///
/// ```text
/// tick: active students ─▶ generate_due_reports (each, fail-soft) ─▶ sweep_overdue (once)
/// ```
pub struct DailyScheduler<S: Storage, N: Notifier> {
    manager: ReportLifecycleManager<S, N>,
    config: SchedulerConfig,
    running: Mutex<()>,
    ticks_run: AtomicUsize,
}

impl<S: Storage + 'static, N: Notifier + 'static> DailyScheduler<S, N> {
    /// Create a scheduler driving `manager`.
    pub fn new(manager: ReportLifecycleManager<S, N>) -> Self {
        Self {
            manager,
            config: SchedulerConfig::default(),
            running: Mutex::new(()),
            ticks_run: AtomicUsize::new(0),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Completed ticks so far.
    pub fn ticks(&self) -> usize {
        self.ticks_run.load(Ordering::Relaxed)
    }

    /// Run one tick for `now`, unless one is already in flight.
    pub async fn tick(&self, now: Time) -> TickOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous scheduler tick still running, skipping");
            return TickOutcome::Skipped;
        };

        let report = self.run_tick(now).await;
        self.ticks_run.fetch_add(1, Ordering::Relaxed);
        TickOutcome::Completed(report)
    }

    async fn run_tick(&self, now: Time) -> TickReport {
        info!("Starting scheduler tick for {}", now);
        let mut report = TickReport {
            ran_at: now,
            students_scanned: 0,
            reports_created: 0,
            overdue_marked: 0,
            failures: Vec::new(),
        };

        // 1. Active students
        let students = match self.manager.storage().find_active_students(now).await {
            Ok(students) => students,
            Err(e) => {
                error!("Failed to list active students: {}", e);
                report.failures.push(TickFailure {
                    student: None,
                    error: e.to_string(),
                });
                Vec::new()
            }
        };
        report.students_scanned = students.len();

        // 2. Due reports, one student at a time
        for student in &students {
            match self.manager.generate_due_reports(student.id, now).await {
                Ok(created) => {
                    debug!("Student {}: {} reports created", student.id, created.len());
                    report.reports_created += created.len();
                }
                Err(e) => {
                    error!("Error creating due reports for student {}: {}", student.id, e);
                    report.failures.push(TickFailure {
                        student: Some(student.id),
                        error: e.to_string(),
                    });
                }
            }
        }

        // 3. Overdue sweep, once
        match self.manager.sweep_overdue(now).await {
            Ok(overdue) => report.overdue_marked = overdue.len(),
            Err(e) => {
                error!("Error checking overdue reports: {}", e);
                report.failures.push(TickFailure {
                    student: None,
                    error: e.to_string(),
                });
            }
        }

        info!(
            "Scheduler tick done: {} students, {} reports created, {} overdue, {} failures",
            report.students_scanned,
            report.reports_created,
            report.overdue_marked,
            report.failures.len()
        );
        report
    }

    /// Tick every day at the configured time until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        if self.config.run_on_start {
            self.tick(Utc::now()).await;
        }

        loop {
            let now = Utc::now();
            let next = next_fire_after(now, self.config.fire_at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!("Next scheduler tick at {}", next);

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.tick(Utc::now()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use chrono::{Duration, TimeZone};
    use internhub_core::{
        InternshipDetails, InternshipStatus, MentorId, Report, ReportStatus, ReportType, Student,
        StudentProgress,
    };
    use internhub_notify::{NotifyConfig, StoreNotifier};
    use internhub_storage::JsonStorage;

    type Scheduler = DailyScheduler<JsonStorage, StoreNotifier<JsonStorage>>;

    fn day(n: i64) -> Time {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn create_test_student(mentor: Option<MentorId>) -> Student {
        Student {
            id: StudentId::new(),
            first_name: "Bob".to_string(),
            last_name: "Smith".to_string(),
            email: "bob@example.com".to_string(),
            internship: InternshipDetails {
                company_name: "Data Inc".to_string(),
                start_date: day(0),
                end_date: day(180),
                status: InternshipStatus::Approved,
            },
            internal_mentor: mentor,
            progress: StudentProgress::default(),
        }
    }

    async fn setup() -> (tempfile::TempDir, Arc<JsonStorage>, Scheduler) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(JsonStorage::new(dir.path()).await.unwrap());
        let notifier = Arc::new(StoreNotifier::new(storage.clone(), NotifyConfig::default()));
        let manager = ReportLifecycleManager::new(storage.clone(), notifier);
        (dir, storage, DailyScheduler::new(manager))
    }

    #[tokio::test]
    async fn test_tick_is_fail_soft_per_student() {
        let (_dir, storage, scheduler) = setup().await;

        let with_mentor = create_test_student(Some(MentorId::new()));
        let without_mentor = create_test_student(None);
        let mut not_approved = create_test_student(Some(MentorId::new()));
        not_approved.internship.status = InternshipStatus::Pending;
        for s in [&with_mentor, &without_mentor, &not_approved] {
            storage.save_student(s).await.unwrap();
        }

        let stale = Report::new_pending(
            ReportType::Fortnightly,
            with_mentor.id,
            with_mentor.internal_mentor.unwrap(),
            "Fortnightly Report",
            "placeholder",
            day(10),
            day(0),
        );
        storage.save_report(&stale).await.unwrap();

        let TickOutcome::Completed(report) = scheduler.tick(day(15)).await else {
            panic!("tick was skipped");
        };
        assert_eq!(report.students_scanned, 2);
        assert_eq!(report.reports_created, 1);
        assert_eq!(report.overdue_marked, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].student, Some(without_mentor.id));

        let stored = storage.load_report(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Overdue);
        assert_eq!(scheduler.ticks(), 1);
    }

    #[tokio::test]
    async fn test_sweep_runs_when_student_listing_fails() {
        let (dir, storage, scheduler) = setup().await;
        let student = create_test_student(Some(MentorId::new()));
        let stale = Report::new_pending(
            ReportType::Assignment,
            student.id,
            student.internal_mentor.unwrap(),
            "Monthly Assignment",
            "placeholder",
            day(30),
            day(0),
        );
        storage.save_report(&stale).await.unwrap();

        let students_dir = dir.path().join("students");
        std::fs::remove_dir_all(&students_dir).unwrap();
        std::fs::write(&students_dir, b"not a directory").unwrap();
        assert!(storage.find_active_students(day(31)).await.is_err());

        let TickOutcome::Completed(report) = scheduler.tick(day(31)).await else {
            panic!("tick was skipped");
        };
        assert_eq!(report.students_scanned, 0);
        assert_eq!(report.overdue_marked, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].student, None);

        let stored = storage.load_report(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Overdue);
    }

    #[tokio::test]
    async fn test_repeated_tick_does_not_duplicate() {
        let (_dir, storage, scheduler) = setup().await;
        let student = create_test_student(Some(MentorId::new()));
        storage.save_student(&student).await.unwrap();

        scheduler.tick(day(30)).await;
        let TickOutcome::Completed(second) = scheduler.tick(day(30)).await else {
            panic!("tick was skipped");
        };
        assert_eq!(second.reports_created, 0);

        let reports = storage
            .list_reports(&internhub_storage::ReportFilter::for_student(student.id))
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let (_dir, storage, scheduler) = setup().await;
        storage
            .save_student(&create_test_student(Some(MentorId::new())))
            .await
            .unwrap();

        let (a, b) = tokio::join!(scheduler.tick(day(15)), scheduler.tick(day(15)));
        let skipped = [&a, &b]
            .iter()
            .filter(|o| matches!(o, TickOutcome::Skipped))
            .count();
        assert_eq!(skipped, 1);
        assert_eq!(scheduler.ticks(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_dir, _storage, scheduler) = setup().await;
        let scheduler = scheduler.with_config(SchedulerConfig::default().with_run_on_start(true));

        scheduler.run(std::future::ready(())).await;
        assert_eq!(scheduler.ticks(), 1);
    }
}
