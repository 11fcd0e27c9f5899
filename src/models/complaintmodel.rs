// src/models/complaintmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "complaint_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintType {
    Wifi,
    Cctv,
}

impl ComplaintType {
    /// Prefix used when generating the human-facing ticket code.
    pub fn ticket_prefix(&self) -> &str {
        match self {
            ComplaintType::Wifi => "WIFI",
            ComplaintType::Cctv => "CCTV",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "complaint_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintPriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "complaint_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Assigned,
    InProgress,
    Visited,
    Resolved,
    NotResolved,
    Cancelled,
    Reopened,
    ReVisit,
}

impl ComplaintStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Assigned => "assigned",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Visited => "visited",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::NotResolved => "not_resolved",
            ComplaintStatus::Cancelled => "cancelled",
            ComplaintStatus::Reopened => "reopened",
            ComplaintStatus::ReVisit => "re_visit",
        }
    }

    /// Display color for the status. Pure lookup, the stored column is only
    /// ever written from this function, never independently.
    pub fn color(&self) -> &str {
        match self {
            ComplaintStatus::Pending => "#FFA500",
            ComplaintStatus::Assigned => "#1E90FF",
            ComplaintStatus::InProgress => "#00BFFF",
            ComplaintStatus::Visited => "#9370DB",
            ComplaintStatus::Resolved => "#32CD32",
            ComplaintStatus::NotResolved => "#FF4500",
            ComplaintStatus::Cancelled => "#DC143C",
            ComplaintStatus::Reopened => "#FF69B4",
            ComplaintStatus::ReVisit => "#FFD700",
        }
    }

    /// Engineer reassignment is rejected once the ticket has reached one of
    /// these states.
    pub fn is_terminal_for_reassignment(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::Resolved | ComplaintStatus::Cancelled | ComplaintStatus::NotResolved
        )
    }

    /// Deletion is only allowed before any field work has happened.
    pub fn is_deletable(&self) -> bool {
        matches!(self, ComplaintStatus::Pending | ComplaintStatus::Cancelled)
    }
}

/// Audit-trail action tags. One row is appended per lifecycle event; the tag
/// is what `has_engineer_assigned` and the replay queries filter on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    ComplaintCreated,
    StatusChanged,
    EngineerAssigned,
    EngineerReassigned,
    ComplaintClosed,
    OtpVerified,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Complaint {
    pub id: Uuid,
    pub ticket_code: String,
    pub title: String,
    pub description: String,
    pub issue_type: String,
    pub user_id: Uuid,
    pub phone_number: String,
    pub complaint_type: ComplaintType,
    pub priority: ComplaintPriority,
    pub status: ComplaintStatus,
    #[serde(rename = "statusColor")]
    pub status_color: String,
    pub engineer_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,

    pub visit_date: Option<DateTime<Utc>>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub resolved: bool,
    pub not_resolved_reason: Option<String>,
    pub resolution_notes: Option<String>,
    pub remark: Option<String>,

    pub attachments: Vec<String>,
    pub resolution_attachments: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    pub otp_verified: bool,
    pub otp_verified_at: Option<DateTime<Utc>>,

    pub parent_complaint_id: Option<Uuid>,
    pub is_recomplaint: bool,

    // Optimistic concurrency counter; every transition bumps it and every
    // write is conditional on the last-seen value.
    pub version: i32,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub status: ComplaintStatus,
    pub previous_status: Option<ComplaintStatus>,
    pub action: HistoryAction,
    pub remarks: Option<String>,
    pub metadata: serde_json::Value,
    pub changed_by: Option<Uuid>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for a history append. The complaint id, ordering and timestamp
/// are supplied by the database layer inside the same transaction as the
/// parent-row update.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub status: ComplaintStatus,
    pub previous_status: Option<ComplaintStatus>,
    pub action: HistoryAction,
    pub remarks: Option<String>,
    pub metadata: serde_json::Value,
    pub changed_by: Option<Uuid>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComplaintWithUser {
    #[sqlx(flatten)]
    pub complaint: Complaint,
    pub user_name: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_a_color() {
        let statuses = [
            ComplaintStatus::Pending,
            ComplaintStatus::Assigned,
            ComplaintStatus::InProgress,
            ComplaintStatus::Visited,
            ComplaintStatus::Resolved,
            ComplaintStatus::NotResolved,
            ComplaintStatus::Cancelled,
            ComplaintStatus::Reopened,
            ComplaintStatus::ReVisit,
        ];
        for status in statuses {
            assert!(status.color().starts_with('#'), "{:?}", status);
            assert_eq!(status.color().len(), 7, "{:?}", status);
        }
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: ComplaintStatus = serde_json::from_str("\"re_visit\"").unwrap();
        assert_eq!(back, ComplaintStatus::ReVisit);
    }

    #[test]
    fn unknown_status_is_rejected_at_the_boundary() {
        let parsed = serde_json::from_str::<ComplaintStatus>("\"escalated\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn terminal_states_block_reassignment() {
        assert!(ComplaintStatus::Resolved.is_terminal_for_reassignment());
        assert!(ComplaintStatus::Cancelled.is_terminal_for_reassignment());
        assert!(ComplaintStatus::NotResolved.is_terminal_for_reassignment());
        assert!(!ComplaintStatus::Visited.is_terminal_for_reassignment());
        assert!(!ComplaintStatus::Reopened.is_terminal_for_reassignment());
    }
}
