// services/closure_service.rs
//
// Two-phase terminal confirmation: the engineer closes with evidence and a
// one-time code is generated; the customer later submits the code to attest
// the resolution. Verification flips an orthogonal flag, the primary status
// stays `resolved`.
use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, userdb::UserExt},
    models::complaintmodel::{Complaint, ComplaintStatus, HistoryAction},
    service::{
        complaint_service::ComplaintService, error::ServiceError,
        notification_service::NotificationService,
    },
    utils::code_generator::generate_otp,
};

pub const MIN_RESOLUTION_ATTACHMENTS: usize = 2;
pub const MAX_RESOLUTION_ATTACHMENTS: usize = 4;

/// Closure evidence must be 2 to 4 images.
pub fn resolution_attachments_guard(attachments: &[String]) -> Result<(), ServiceError> {
    let count = attachments.len();
    if !(MIN_RESOLUTION_ATTACHMENTS..=MAX_RESOLUTION_ATTACHMENTS).contains(&count) {
        return Err(ServiceError::InvalidAttachmentCount(count));
    }
    Ok(())
}

/// Constant-time comparison; the code space is small enough that a timing
/// side channel would be worth the attacker's while.
pub fn otp_matches(stored: &str, submitted: &str) -> bool {
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

/// Verification preconditions, checked before any mutation: the ticket must
/// be resolved, not yet verified, carry a stored code, and the submitted
/// code must match it. A failure here means the complaint is left exactly as
/// it was read.
pub fn verify_guard(complaint: &Complaint, submitted_code: &str) -> Result<(), ServiceError> {
    if complaint.status != ComplaintStatus::Resolved {
        return Err(ServiceError::InvalidTransition(format!(
            "complaint {} is not resolved yet",
            complaint.id
        )));
    }
    if complaint.otp_verified {
        return Err(ServiceError::AlreadyVerified(complaint.id));
    }

    let stored = complaint.otp.as_deref().ok_or_else(|| {
        ServiceError::InvalidTransition(format!(
            "complaint {} has no confirmation code on record",
            complaint.id
        ))
    })?;

    if !otp_matches(stored, submitted_code) {
        return Err(ServiceError::InvalidOtp);
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ClosureService {
    db_client: Arc<DBClient>,
    complaint_service: Arc<ComplaintService>,
    notification_service: Arc<NotificationService>,
}

impl ClosureService {
    pub fn new(
        db_client: Arc<DBClient>,
        complaint_service: Arc<ComplaintService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_client,
            complaint_service,
            notification_service,
        }
    }

    /// Phase 1: store the evidence, move the ticket to `resolved` and hand a
    /// one-time code to the customer. The email leaves after the transaction
    /// commits and never rolls it back.
    pub async fn close_complaint(
        &self,
        complaint_id: Uuid,
        resolution_attachments: Vec<String>,
        notes: Option<String>,
        acting_user: Uuid,
    ) -> Result<Complaint, ServiceError> {
        resolution_attachments_guard(&resolution_attachments)?;

        let mut complaint = self.complaint_service.get_complaint(complaint_id).await?;
        if complaint.status == ComplaintStatus::Resolved {
            return Err(ServiceError::AlreadyResolved(complaint_id));
        }

        let otp = generate_otp();
        complaint.otp = Some(otp.clone());
        complaint.resolution_attachments = Some(resolution_attachments.clone());
        complaint.resolution_notes = notes.clone();

        let updated = self
            .complaint_service
            .commit_transition(
                complaint,
                ComplaintStatus::Resolved,
                HistoryAction::ComplaintClosed,
                notes,
                serde_json::json!({
                    "otp": otp,
                    "resolution_attachments": resolution_attachments,
                }),
                acting_user,
                None,
            )
            .await?;

        match self.db_client.get_user(Some(updated.user_id), None).await? {
            Some(customer) => {
                self.notification_service.dispatch_resolution_otp(
                    customer.email,
                    customer.name,
                    updated.ticket_code.clone(),
                    otp,
                );
            }
            None => {
                tracing::warn!(
                    "complaint {} closed but owner {} no longer exists, skipping OTP email",
                    updated.id,
                    updated.user_id
                );
            }
        }

        Ok(updated)
    }

    /// Phase 2: the customer attests the resolution with the code. A
    /// mismatch changes nothing; a match flips the flag exactly once.
    pub async fn verify_otp(
        &self,
        complaint_id: Uuid,
        submitted_code: &str,
        acting_user: Uuid,
    ) -> Result<Complaint, ServiceError> {
        let mut complaint = self.complaint_service.get_complaint(complaint_id).await?;

        verify_guard(&complaint, submitted_code)?;

        complaint.otp_verified = true;
        complaint.otp_verified_at = Some(Utc::now());

        self.complaint_service
            .commit_transition(
                complaint,
                ComplaintStatus::Resolved,
                HistoryAction::OtpVerified,
                None,
                serde_json::json!({}),
                acting_user,
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::complaint_service::tests::sample_complaint;

    #[test]
    fn attachment_bounds_are_two_to_four() {
        let urls = |n: usize| (0..n).map(|i| format!("img-{}.jpg", i)).collect::<Vec<_>>();

        assert!(matches!(
            resolution_attachments_guard(&urls(0)),
            Err(ServiceError::InvalidAttachmentCount(0))
        ));
        assert!(matches!(
            resolution_attachments_guard(&urls(1)),
            Err(ServiceError::InvalidAttachmentCount(1))
        ));
        assert!(resolution_attachments_guard(&urls(2)).is_ok());
        assert!(resolution_attachments_guard(&urls(3)).is_ok());
        assert!(resolution_attachments_guard(&urls(4)).is_ok());
        assert!(matches!(
            resolution_attachments_guard(&urls(5)),
            Err(ServiceError::InvalidAttachmentCount(5))
        ));
    }

    #[test]
    fn otp_comparison_is_exact() {
        assert!(otp_matches("0421", "0421"));
        assert!(!otp_matches("0421", "0422"));
        assert!(!otp_matches("0421", "421"));
        assert!(!otp_matches("0421", ""));
    }

    #[test]
    fn correct_code_on_a_resolved_ticket_passes() {
        let mut complaint = sample_complaint(ComplaintStatus::Resolved);
        complaint.otp = Some("0421".to_string());
        assert!(verify_guard(&complaint, "0421").is_ok());
    }

    #[test]
    fn second_correct_submission_is_rejected() {
        let mut complaint = sample_complaint(ComplaintStatus::Resolved);
        complaint.otp = Some("0421".to_string());
        complaint.otp_verified = true;

        assert!(matches!(
            verify_guard(&complaint, "0421"),
            Err(ServiceError::AlreadyVerified(id)) if id == complaint.id
        ));
    }

    #[test]
    fn unresolved_ticket_cannot_be_verified() {
        let mut complaint = sample_complaint(ComplaintStatus::InProgress);
        complaint.otp = Some("0421".to_string());
        assert!(matches!(
            verify_guard(&complaint, "0421"),
            Err(ServiceError::InvalidTransition(_))
        ));
    }

    #[test]
    fn resolved_ticket_without_a_stored_code_is_rejected() {
        let complaint = sample_complaint(ComplaintStatus::Resolved);
        assert!(complaint.otp.is_none());
        assert!(matches!(
            verify_guard(&complaint, "0421"),
            Err(ServiceError::InvalidTransition(_))
        ));
    }

    #[test]
    fn mismatched_code_leaves_the_ticket_untouched() {
        let mut complaint = sample_complaint(ComplaintStatus::Resolved);
        complaint.otp = Some("0421".to_string());
        let before = complaint.clone();

        assert!(matches!(
            verify_guard(&complaint, "9999"),
            Err(ServiceError::InvalidOtp)
        ));
        assert!(!complaint.otp_verified);
        assert!(complaint.otp_verified_at.is_none());
        assert_eq!(complaint.version, before.version);
        assert_eq!(complaint.status, before.status);
    }
}
