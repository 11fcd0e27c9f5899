//  src/dtos/complaintdtos.rs
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::complaintmodel::{ComplaintPriority, ComplaintStatus, ComplaintType};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComplaintDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1-200 characters"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Description must be between 1-2000 characters"
    ))]
    pub description: String,

    #[validate(length(min = 1, max = 100, message = "Issue type is required"))]
    pub issue_type: String,

    #[validate(length(
        min = 10,
        max = 20,
        message = "Phone number must be between 10-20 characters"
    ))]
    pub phone_number: String,

    pub complaint_type: ComplaintType,

    pub priority: Option<ComplaintPriority>,

    // Intake evidence, already uploaded; at most 4 image URLs.
    pub attachments: Option<Vec<String>>,

    // Staff may file on a customer's behalf.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignEngineerDto {
    pub engineer_id: Uuid,
    pub priority: Option<ComplaintPriority>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReassignComplaintDto {
    pub complaint_id: Uuid,
    pub engineer_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusDto {
    pub status: ComplaintStatus,
    pub remark: Option<String>,
    pub notes: Option<String>,
    pub not_resolved_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CloseComplaintDto {
    pub resolution_attachments: Vec<String>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOtpDto {
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecomplaintDto {
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ComplaintQueryParams {
    #[validate(range(min = 1))]
    pub page: Option<i32>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i32>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<ComplaintPriority>,
    pub complaint_type: Option<ComplaintType>,
}
