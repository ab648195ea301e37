//! JSON file storage implementation.
//!
//! Stores each record as a JSON document under a data directory and keeps
//! small per-object meta markers (version + updated_at) next to them.

use std::path::{Path, PathBuf};
use internhub_core::{
    Notification, NotificationId, RecipientKind, Report, ReportId, Student, StudentId,
};
use super::{ReportFilter, Storage, StorageError, Result};
use tokio::fs;
use tracing::debug;

const REPORTS: &str = "reports";
const STUDENTS: &str = "students";
const NOTIFICATIONS: &str = "notifications";

/// File-based JSON storage backend.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the data and meta directories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        for kind in [REPORTS, STUDENTS, NOTIFICATIONS] {
            fs::create_dir_all(root.join(kind)).await?;
            fs::create_dir_all(root.join("meta").join(kind)).await?;
        }

        Ok(Self { root })
    }

    /// Root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn doc_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(kind).join(format!("{}.json", id))
    }

    fn meta_path(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join("meta").join(kind).join(format!("{}.meta.json", id))
    }

    /// Write a document and bump its version marker.
    async fn write_doc<T: serde::Serialize>(&self, kind: &str, id: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.doc_path(kind, id), json.as_bytes()).await?;
        let version = self.bump_version(kind, id).await?;
        debug!(kind, id, version, "document saved");
        Ok(())
    }

    /// Read and increment per-object version, return new version.
    async fn bump_version(&self, kind: &str, id: &str) -> Result<u64> {
        let path = self.meta_path(kind, id);
        let mut version = 0u64;
        if let Ok(s) = fs::read_to_string(&path).await {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(v) = json.get("version").and_then(|v| v.as_u64()) {
                    version = v;
                }
            }
        }
        version += 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        fs::write(&path, serde_json::to_string_pretty(&meta)?.as_bytes()).await?;
        Ok(version)
    }

    async fn remove_doc(&self, kind: &str, id: &str) -> Result<()> {
        match fs::remove_file(self.doc_path(kind, id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(format!("{kind}/{id}")));
            }
            Err(e) => return Err(e.into()),
        }
        // Marker may be absent.
        let _ = fs::remove_file(self.meta_path(kind, id)).await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_report(&self, report: &Report) -> Result<()> {
        self.write_doc(REPORTS, &report.id.to_string(), report).await
    }

    async fn load_report(&self, id: ReportId) -> Result<Option<Report>> {
        read_json(&self.doc_path(REPORTS, &id.to_string())).await
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>> {
        let all: Vec<Report> = list_dir(&self.root.join(REPORTS)).await?;
        let mut reports: Vec<Report> = all.into_iter().filter(|r| filter.matches(r)).collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn delete_report(&self, id: ReportId) -> Result<()> {
        self.remove_doc(REPORTS, &id.to_string()).await
    }

    async fn save_student(&self, student: &Student) -> Result<()> {
        self.write_doc(STUDENTS, &student.id.to_string(), student).await
    }

    async fn load_student(&self, id: StudentId) -> Result<Option<Student>> {
        read_json(&self.doc_path(STUDENTS, &id.to_string())).await
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        list_dir(&self.root.join(STUDENTS)).await
    }

    async fn save_notification(&self, notification: &Notification) -> Result<()> {
        self.write_doc(NOTIFICATIONS, &notification.id.to_string(), notification)
            .await
    }

    async fn load_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        read_json(&self.doc_path(NOTIFICATIONS, &id.to_string())).await
    }

    async fn list_notifications(
        &self,
        recipient: &str,
        kind: RecipientKind,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let all: Vec<Notification> = list_dir(&self.root.join(NOTIFICATIONS)).await?;
        let mut matching: Vec<Notification> = all
            .into_iter()
            .filter(|n| n.recipient == recipient && n.recipient_kind == kind)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping unreadable document {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use internhub_core::{
        InternshipDetails, InternshipStatus, MentorId, NotificationKind, ReportStatus, ReportType,
        StudentProgress,
    };

    fn create_test_student(status: InternshipStatus) -> Student {
        let now = Utc::now();
        Student {
            id: StudentId::new(),
            first_name: "Alice".to_string(),
            last_name: "Johnson".to_string(),
            email: "alice@example.com".to_string(),
            internship: InternshipDetails {
                company_name: "Tech Corp".to_string(),
                start_date: now - Duration::days(20),
                end_date: now + Duration::days(60),
                status,
            },
            internal_mentor: Some(MentorId::new()),
            progress: StudentProgress::default(),
        }
    }

    fn create_test_report(student: StudentId, mentor: MentorId) -> Report {
        let now = Utc::now();
        Report::new_pending(
            ReportType::Fortnightly,
            student,
            mentor,
            "Fortnightly Report",
            "Please fill in your fortnightly progress report",
            now + Duration::days(15),
            now,
        )
    }

    #[tokio::test]
    async fn test_report_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let report = create_test_report(StudentId::new(), MentorId::new());
        storage.save_report(&report).await.unwrap();

        let loaded = storage.load_report(report.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.status, ReportStatus::Pending);
        assert_eq!(loaded.deadline, report.deadline);
    }

    #[tokio::test]
    async fn test_missing_report_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        assert!(storage.load_report(ReportId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_reports_filters() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let student = StudentId::new();
        let mentor = MentorId::new();
        let mine = create_test_report(student, mentor);
        let other = create_test_report(StudentId::new(), MentorId::new());
        storage.save_report(&mine).await.unwrap();
        storage.save_report(&other).await.unwrap();

        let by_student = storage.list_reports(&ReportFilter::for_student(student)).await.unwrap();
        assert_eq!(by_student.len(), 1);
        assert_eq!(by_student[0].id, mine.id);

        let by_mentor = storage.list_reports(&ReportFilter::for_mentor(mentor)).await.unwrap();
        assert_eq!(by_mentor.len(), 1);

        let overdue = storage
            .list_reports(&ReportFilter {
                deadline_before: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(overdue.is_empty());

        let all = storage.list_reports(&ReportFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_report() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let report = create_test_report(StudentId::new(), MentorId::new());
        storage.save_report(&report).await.unwrap();
        storage.delete_report(report.id).await.unwrap();

        assert!(storage.load_report(report.id).await.unwrap().is_none());
        assert!(matches!(
            storage.delete_report(report.id).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_version_marker_increments() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let report = create_test_report(StudentId::new(), MentorId::new());
        storage.save_report(&report).await.unwrap();
        storage.save_report(&report).await.unwrap();

        let meta = std::fs::read_to_string(storage.meta_path(REPORTS, &report.id.to_string())).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&meta).unwrap();
        assert_eq!(meta["version"], 2);
    }

    #[tokio::test]
    async fn test_find_active_students() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let active = create_test_student(InternshipStatus::Approved);
        let pending = create_test_student(InternshipStatus::Pending);
        let mut finished = create_test_student(InternshipStatus::Approved);
        finished.internship.end_date = Utc::now() - Duration::days(1);

        for s in [&active, &pending, &finished] {
            storage.save_student(s).await.unwrap();
        }

        let found = storage.find_active_students(Utc::now()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, active.id);
        assert_eq!(found[0].mentor_id, active.internal_mentor);
    }

    #[tokio::test]
    async fn test_assigned_mentor() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let assigned = create_test_student(InternshipStatus::Approved);
        let mut unassigned = create_test_student(InternshipStatus::Approved);
        unassigned.internal_mentor = None;
        storage.save_student(&assigned).await.unwrap();
        storage.save_student(&unassigned).await.unwrap();

        assert_eq!(
            storage.assigned_mentor(assigned.id).await.unwrap(),
            assigned.internal_mentor
        );
        assert_eq!(storage.assigned_mentor(unassigned.id).await.unwrap(), None);
        assert_eq!(storage.assigned_mentor(StudentId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_notifications_newest_first_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();

        let recipient = StudentId::new().to_string();
        for i in 0..3 {
            let mut n = Notification::new(
                recipient.clone(),
                RecipientKind::Student,
                NotificationKind::DeadlineReminder,
                format!("Reminder {i}"),
                "Report overdue",
            );
            n.created_at = Utc::now() + Duration::seconds(i);
            storage.save_notification(&n).await.unwrap();
        }
        let for_mentor = Notification::new(
            recipient.clone(),
            RecipientKind::Mentor,
            NotificationKind::ReportSubmitted,
            "Submitted",
            "x",
        );
        storage.save_notification(&for_mentor).await.unwrap();

        let inbox = storage
            .list_notifications(&recipient, RecipientKind::Student, 2)
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].title, "Reminder 2");
        assert_eq!(inbox[1].title, "Reminder 1");
    }

    #[tokio::test]
    async fn test_non_json_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonStorage::new(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(STUDENTS).join("README.txt"), "notes").unwrap();
        std::fs::write(dir.path().join(STUDENTS).join("broken.json"), "{").unwrap();

        assert!(storage.list_students().await.unwrap().is_empty());
    }
}
