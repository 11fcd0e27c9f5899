// services/complaint_service.rs
//
// The transition engine. Every status mutation in the system funnels through
// `commit_transition`: the derived fields are computed as explicit ordered
// steps in `apply_status`, then the row update and the history append are
// persisted together, guarded by the complaint's version counter.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::{complaintdb::ComplaintExt, db::DBClient},
    models::complaintmodel::*,
    service::error::ServiceError,
};

/// Intake evidence is capped; resolution evidence has its own bounds at
/// closure time.
pub const MAX_INTAKE_ATTACHMENTS: usize = 4;

/// Applies `new_status` to the complaint in memory and derives the dependent
/// fields, in order: previous status is captured first, then status and its
/// display color, then the lifecycle timestamps. Timestamp derivation is
/// idempotent: an existing visit or resolution date is never overwritten.
///
/// Returns the status the complaint held before the change.
pub fn apply_status(
    complaint: &mut Complaint,
    new_status: ComplaintStatus,
    now: DateTime<Utc>,
) -> ComplaintStatus {
    let previous = complaint.status;

    complaint.status = new_status;
    complaint.status_color = new_status.color().to_string();

    if new_status == ComplaintStatus::Visited && complaint.visit_date.is_none() {
        complaint.visit_date = Some(now);
    }

    if new_status == ComplaintStatus::Resolved {
        if complaint.resolution_date.is_none() {
            complaint.resolution_date = Some(now);
        }
        complaint.resolved = true;
    }

    previous
}

#[derive(Debug, Clone)]
pub struct ComplaintService {
    db_client: Arc<DBClient>,
}

impl ComplaintService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn get_complaint(&self, complaint_id: Uuid) -> Result<Complaint, ServiceError> {
        self.db_client
            .get_complaint(complaint_id)
            .await?
            .ok_or(ServiceError::ComplaintNotFound(complaint_id))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_complaint(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
        issue_type: String,
        phone_number: String,
        complaint_type: ComplaintType,
        priority: ComplaintPriority,
        attachments: Vec<String>,
        created_by: Uuid,
    ) -> Result<Complaint, ServiceError> {
        if attachments.len() > MAX_INTAKE_ATTACHMENTS {
            return Err(ServiceError::Validation(format!(
                "At most {} intake images are allowed",
                MAX_INTAKE_ATTACHMENTS
            )));
        }

        let complaint = self
            .db_client
            .create_complaint(
                user_id,
                title,
                description,
                issue_type,
                phone_number,
                complaint_type,
                priority,
                attachments,
                None,
                created_by,
            )
            .await?;

        Ok(complaint)
    }

    /// Reopens an issue as a fresh ticket linked to the prior one. The parent
    /// keeps its own history untouched.
    pub async fn create_recomplaint(
        &self,
        parent_id: Uuid,
        description: Option<String>,
        created_by: Uuid,
    ) -> Result<Complaint, ServiceError> {
        let parent = self.get_complaint(parent_id).await?;

        let complaint = self
            .db_client
            .create_complaint(
                parent.user_id,
                parent.title.clone(),
                description.unwrap_or_else(|| parent.description.clone()),
                parent.issue_type.clone(),
                parent.phone_number.clone(),
                parent.complaint_type,
                parent.priority,
                Vec::new(),
                Some(parent.id),
                created_by,
            )
            .await?;

        Ok(complaint)
    }

    /// Persists an in-memory mutation of `complaint` as one atomic step:
    /// status derivation, row update and history append either all commit or
    /// none do. Callers may set auxiliary fields (engineer, evidence, OTP
    /// flags) on the complaint before calling; `expected_version` must be the
    /// version the row carried when it was read.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn commit_transition(
        &self,
        mut complaint: Complaint,
        new_status: ComplaintStatus,
        action: HistoryAction,
        notes: Option<String>,
        metadata: serde_json::Value,
        acting_user: Uuid,
        additional_info: Option<String>,
    ) -> Result<Complaint, ServiceError> {
        let expected_version = complaint.version;
        let previous = apply_status(&mut complaint, new_status, Utc::now());

        let entry = NewHistoryEntry {
            status: new_status,
            previous_status: Some(previous),
            action,
            remarks: notes,
            metadata,
            changed_by: Some(acting_user),
            additional_info,
        };

        let updated = self
            .db_client
            .update_complaint_guarded(&complaint, expected_version, entry)
            .await?
            .ok_or(ServiceError::TransitionConflict(complaint.id))?;

        Ok(updated)
    }

    /// Plain status change, as driven by the status-update endpoint.
    pub async fn transition(
        &self,
        mut complaint: Complaint,
        new_status: ComplaintStatus,
        notes: Option<String>,
        remark: Option<String>,
        not_resolved_reason: Option<String>,
        acting_user: Uuid,
    ) -> Result<Complaint, ServiceError> {
        if let Some(remark) = remark {
            complaint.remark = Some(remark);
        }
        if new_status == ComplaintStatus::NotResolved {
            complaint.not_resolved_reason = not_resolved_reason;
        }

        self.commit_transition(
            complaint,
            new_status,
            HistoryAction::StatusChanged,
            notes,
            serde_json::json!({}),
            acting_user,
            None,
        )
        .await
    }

    pub async fn status_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        // Existence check so an unknown id reads as 404, not an empty trail.
        self.get_complaint(complaint_id).await?;
        Ok(self.db_client.get_status_history(complaint_id).await?)
    }

    /// Physical deletion is only allowed before any field work has happened.
    pub async fn delete_complaint(&self, complaint_id: Uuid) -> Result<(), ServiceError> {
        let complaint = self.get_complaint(complaint_id).await?;
        if !complaint.status.is_deletable() {
            return Err(ServiceError::NotDeletable(complaint_id));
        }
        self.db_client.delete_complaint(complaint_id).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_complaint(status: ComplaintStatus) -> Complaint {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Complaint {
            id: Uuid::new_v4(),
            ticket_code: "WIFI-12345".to_string(),
            title: "No internet".to_string(),
            description: "Router light is red".to_string(),
            issue_type: "connectivity".to_string(),
            user_id: Uuid::new_v4(),
            phone_number: "+2348012345678".to_string(),
            complaint_type: ComplaintType::Wifi,
            priority: ComplaintPriority::Medium,
            status,
            status_color: status.color().to_string(),
            engineer_id: None,
            assigned_by: None,
            visit_date: None,
            resolution_date: None,
            resolved: false,
            not_resolved_reason: None,
            resolution_notes: None,
            remark: None,
            attachments: Vec::new(),
            resolution_attachments: None,
            otp: None,
            otp_verified: false,
            otp_verified_at: None,
            parent_complaint_id: None,
            is_recomplaint: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn apply_status_captures_previous_and_derives_color() {
        let mut complaint = sample_complaint(ComplaintStatus::Pending);
        let previous = apply_status(&mut complaint, ComplaintStatus::Assigned, Utc::now());
        assert_eq!(previous, ComplaintStatus::Pending);
        assert_eq!(complaint.status, ComplaintStatus::Assigned);
        assert_eq!(complaint.status_color, ComplaintStatus::Assigned.color());
    }

    #[test]
    fn visit_date_is_set_once_and_kept() {
        let mut complaint = sample_complaint(ComplaintStatus::InProgress);
        let first = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        apply_status(&mut complaint, ComplaintStatus::Visited, first);
        assert_eq!(complaint.visit_date, Some(first));

        let later = Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap();
        apply_status(&mut complaint, ComplaintStatus::ReVisit, later);
        apply_status(&mut complaint, ComplaintStatus::Visited, later);
        assert_eq!(complaint.visit_date, Some(first));
    }

    #[test]
    fn resolution_date_is_idempotent() {
        let mut complaint = sample_complaint(ComplaintStatus::Visited);
        let first = Utc.with_ymd_and_hms(2026, 3, 4, 15, 0, 0).unwrap();
        apply_status(&mut complaint, ComplaintStatus::Resolved, first);
        assert!(complaint.resolved);
        assert_eq!(complaint.resolution_date, Some(first));

        let later = Utc.with_ymd_and_hms(2026, 3, 5, 15, 0, 0).unwrap();
        apply_status(&mut complaint, ComplaintStatus::Resolved, later);
        assert_eq!(complaint.resolution_date, Some(first));
    }

    #[test]
    fn non_terminal_transitions_leave_lifecycle_fields_alone() {
        let mut complaint = sample_complaint(ComplaintStatus::Pending);
        apply_status(&mut complaint, ComplaintStatus::InProgress, Utc::now());
        assert!(complaint.visit_date.is_none());
        assert!(complaint.resolution_date.is_none());
        assert!(!complaint.resolved);
    }

    #[tokio::test]
    async fn service_wires_up() {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/ispdesk").unwrap();
        let db_client = Arc::new(DBClient::new(pool));
        let svc = ComplaintService::new(db_client);
        let _ = svc.get_complaint(Uuid::nil());
    }
}
