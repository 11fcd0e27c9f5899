// services/assignment_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{complaintdb::ComplaintExt, db::DBClient, userdb::UserExt},
    models::{
        complaintmodel::{
            Complaint, ComplaintPriority, ComplaintStatus, HistoryAction, StatusHistoryEntry,
        },
        usermodel::UserRole,
    },
    service::{complaint_service::ComplaintService, error::ServiceError},
};

/// Pure reassignment guard: terminal tickets and no-op reassignments are
/// rejected before anything touches the database.
pub fn reassignment_guard(
    complaint: &Complaint,
    new_engineer_id: Uuid,
) -> Result<(), ServiceError> {
    if complaint.status.is_terminal_for_reassignment() {
        return Err(ServiceError::NotReassignable(complaint.id, complaint.status));
    }
    if complaint.engineer_id == Some(new_engineer_id) {
        return Err(ServiceError::AlreadyAssigned(new_engineer_id));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AssignmentService {
    db_client: Arc<DBClient>,
    complaint_service: Arc<ComplaintService>,
}

impl AssignmentService {
    pub fn new(db_client: Arc<DBClient>, complaint_service: Arc<ComplaintService>) -> Self {
        Self {
            db_client,
            complaint_service,
        }
    }

    async fn require_engineer(&self, engineer_id: Uuid) -> Result<(), ServiceError> {
        let exists = self
            .db_client
            .get_user(Some(engineer_id), None)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::UserNotFound(engineer_id));
        }
        if !self
            .db_client
            .user_has_role(engineer_id, UserRole::Engineer)
            .await?
        {
            return Err(ServiceError::NotAnEngineer(engineer_id));
        }
        Ok(())
    }

    pub async fn assign(
        &self,
        complaint_id: Uuid,
        engineer_id: Uuid,
        priority: Option<ComplaintPriority>,
        admin_id: Uuid,
    ) -> Result<Complaint, ServiceError> {
        self.require_engineer(engineer_id).await?;

        let mut complaint = self.complaint_service.get_complaint(complaint_id).await?;

        complaint.engineer_id = Some(engineer_id);
        complaint.assigned_by = Some(admin_id);
        if let Some(priority) = priority {
            complaint.priority = priority;
        }

        self.complaint_service
            .commit_transition(
                complaint,
                ComplaintStatus::Assigned,
                HistoryAction::EngineerAssigned,
                None,
                serde_json::json!({
                    "engineer_id": engineer_id,
                    "assigned_by": admin_id,
                }),
                admin_id,
                None,
            )
            .await
    }

    /// Swaps the engineer and resets the ticket to `assigned`, keeping the
    /// previous engineer in the audit metadata for traceability.
    pub async fn reassign(
        &self,
        complaint_id: Uuid,
        new_engineer_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Complaint, ServiceError> {
        let mut complaint = self.complaint_service.get_complaint(complaint_id).await?;
        reassignment_guard(&complaint, new_engineer_id)?;
        self.require_engineer(new_engineer_id).await?;

        let previous_engineer = complaint.engineer_id;
        complaint.engineer_id = Some(new_engineer_id);
        complaint.assigned_by = Some(admin_id);

        self.complaint_service
            .commit_transition(
                complaint,
                ComplaintStatus::Assigned,
                HistoryAction::EngineerReassigned,
                None,
                serde_json::json!({
                    "engineer_id": new_engineer_id,
                    "previous_engineer_id": previous_engineer,
                    "assigned_by": admin_id,
                }),
                admin_id,
                None,
            )
            .await
    }

    /// True only when the engineer field is set AND the audit trail carries at
    /// least one assignment entry. A raw field write that bypassed the trail
    /// does not count.
    pub async fn has_engineer_assigned(&self, complaint: &Complaint) -> Result<bool, ServiceError> {
        if complaint.engineer_id.is_none() {
            return Ok(false);
        }
        Ok(self.db_client.has_assignment_entry(complaint.id).await?)
    }

    /// Replays all assignment entries in chronological order.
    pub async fn engineer_assignment_history(
        &self,
        complaint_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>, ServiceError> {
        self.complaint_service.get_complaint(complaint_id).await?;
        Ok(self.db_client.get_assignment_history(complaint_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::complaint_service::tests::sample_complaint;

    #[test]
    fn reassigning_a_resolved_ticket_is_rejected() {
        let mut complaint = sample_complaint(ComplaintStatus::Resolved);
        complaint.engineer_id = Some(Uuid::new_v4());
        let err = reassignment_guard(&complaint, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ServiceError::NotReassignable(_, _)));
    }

    #[test]
    fn reassigning_cancelled_and_not_resolved_is_rejected() {
        for status in [ComplaintStatus::Cancelled, ComplaintStatus::NotResolved] {
            let complaint = sample_complaint(status);
            assert!(reassignment_guard(&complaint, Uuid::new_v4()).is_err());
        }
    }

    #[test]
    fn reassigning_to_the_current_engineer_is_rejected() {
        let engineer = Uuid::new_v4();
        let mut complaint = sample_complaint(ComplaintStatus::Assigned);
        complaint.engineer_id = Some(engineer);
        let err = reassignment_guard(&complaint, engineer).unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyAssigned(_)));
    }

    #[test]
    fn reassigning_an_active_ticket_to_a_new_engineer_passes_the_guard() {
        let mut complaint = sample_complaint(ComplaintStatus::InProgress);
        complaint.engineer_id = Some(Uuid::new_v4());
        assert!(reassignment_guard(&complaint, Uuid::new_v4()).is_ok());
    }
}
