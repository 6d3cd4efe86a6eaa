//! JSON wire models exchanged between the backend and the client.
//!
//! Field names follow the backend's REST payloads (`upload`, `upload_title`,
//! `zip_file`), so the structs serialise as-is on both sides.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::artifact_file_name;
use crate::types::{JobId, JobStatus, LibraryItemId, Target, UploadId, UploadStatus};

/// Current time truncated to the microsecond precision the store persists,
/// so a record returned on creation compares equal to the same record read
/// back later.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// A submitted screenshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Upload {
    pub id: UploadId,
    pub created_at: DateTime<Utc>,
    /// Human label shown next to the screenshot.
    pub title: String,
    /// Reference to the stored image bytes (absolute URL or media path).
    pub image: String,
    pub status: UploadStatus,
    #[serde(default)]
    pub notes: String,
}

impl Upload {
    /// Whether a conversion may be requested for this upload.
    pub fn is_convertible(&self) -> bool {
        self.status == UploadStatus::Ready
    }
}

// ---------------------------------------------------------------------------
// ConversionJob
// ---------------------------------------------------------------------------

/// A request to convert one upload into one target representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: JobId,
    /// Owning upload. May no longer exist: deleting an upload orphans its jobs.
    #[serde(rename = "upload")]
    pub upload_id: UploadId,
    /// Copy of the upload title taken when the job was created.
    pub upload_title: String,
    pub target: Target,
    pub status: JobStatus,
    #[serde(default)]
    pub log: String,
    /// Archive reference; present iff `status == Success`.
    #[serde(rename = "zip_file", default)]
    pub artifact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversionJob {
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Checks the artifact/status invariant.
    pub fn artifact_consistent(&self) -> bool {
        self.artifact.is_some() == (self.status == JobStatus::Success)
    }

    /// File name to save this job's archive under.
    pub fn artifact_file_name(&self) -> String {
        artifact_file_name(&self.upload_title, self.target)
    }
}

// ---------------------------------------------------------------------------
// LibraryItem
// ---------------------------------------------------------------------------

/// A named artifact promoted from a successful job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryItem {
    pub id: LibraryItemId,
    pub name: String,
    pub target: Target,
    #[serde(rename = "zip_file")]
    pub artifact: String,
    pub created_at: DateTime<Utc>,
}

impl LibraryItem {
    pub fn artifact_file_name(&self) -> String {
        artifact_file_name(&self.name, self.target)
    }
}

// ---------------------------------------------------------------------------
// Requests / responses
// ---------------------------------------------------------------------------

/// Body of `POST /jobs/`. `upload_id` is accepted in place of `upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateJobRequest {
    #[serde(alias = "upload_id")]
    pub upload: UploadId,
    pub target: Target,
}

/// Body of `POST /library/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddToLibraryRequest {
    pub job_id: JobId,
    pub name: String,
}

/// Error payload returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_JSON: &str = r#"{
        "id": "6f1c2a7e-3f0e-4c55-9b7e-2d1d9c1c8a10",
        "upload": "550e8400-e29b-41d4-a716-446655440000",
        "upload_title": "Homepage v1",
        "target": "NEXTJS",
        "status": "SUCCESS",
        "log": "Conversion completed successfully!",
        "zip_file": "/media/builds/6f1c2a7e.zip",
        "created_at": "2026-03-01T10:00:00Z",
        "updated_at": "2026-03-01T10:00:05.250Z"
    }"#;

    #[test]
    fn test_job_parses_backend_payload() {
        let job: ConversionJob = serde_json::from_str(JOB_JSON).unwrap();
        assert_eq!(job.target, Target::Nextjs);
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.artifact.as_deref(), Some("/media/builds/6f1c2a7e.zip"));
        assert!(job.artifact_consistent());
        assert_eq!(job.artifact_file_name(), "homepage_v1_nextjs_template.zip");
    }

    #[test]
    fn test_job_null_artifact() {
        let json = JOB_JSON
            .replace("\"SUCCESS\"", "\"QUEUED\"")
            .replace("\"/media/builds/6f1c2a7e.zip\"", "null");
        let job: ConversionJob = serde_json::from_str(&json).unwrap();
        assert!(job.artifact.is_none());
        assert!(job.artifact_consistent());
        assert!(!job.is_finished());
    }

    #[test]
    fn test_job_invariant_violation_detected() {
        let json = JOB_JSON.replace("\"SUCCESS\"", "\"RUNNING\"");
        let job: ConversionJob = serde_json::from_str(&json).unwrap();
        assert!(!job.artifact_consistent());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = JOB_JSON.replace("\"SUCCESS\"", "\"CANCELLED\"");
        assert!(serde_json::from_str::<ConversionJob>(&json).is_err());
    }

    #[test]
    fn test_create_job_request_accepts_upload_id_alias() {
        let req: CreateJobRequest = serde_json::from_str(
            r#"{"upload_id": "550e8400-e29b-41d4-a716-446655440000", "target": "DJANGO"}"#,
        )
        .unwrap();
        assert_eq!(req.target, Target::Django);

        let out = serde_json::to_value(&req).unwrap();
        assert!(out.get("upload").is_some());
    }

    #[test]
    fn test_upload_notes_default() {
        let upload: Upload = serde_json::from_str(
            r#"{
                "id": "550e8400-e29b-41d4-a716-446655440000",
                "created_at": "2026-03-01T10:00:00Z",
                "title": "Landing",
                "image": "/media/uploads/550e8400.png",
                "status": "PENDING"
            }"#,
        )
        .unwrap();
        assert_eq!(upload.notes, "");
        assert!(!upload.is_convertible());
    }

    #[test]
    fn test_timestamp_now_survives_rfc3339_micros() {
        use chrono::SecondsFormat;

        let now = timestamp_now();
        let text = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        let back: DateTime<Utc> = DateTime::parse_from_rfc3339(&text).unwrap().into();
        assert_eq!(back, now);
    }
}
