use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::HttpError, models::complaintmodel::ComplaintStatus};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Complaint {0} not found")]
    ComplaintNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("User {0} does not have the engineer role")]
    NotAnEngineer(Uuid),

    #[error("Complaint {0} cannot be reassigned from status {1:?}")]
    NotReassignable(Uuid, ComplaintStatus),

    #[error("Engineer {0} is already assigned to this complaint")]
    AlreadyAssigned(Uuid),

    #[error("Complaint {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("Resolution of complaint {0} has already been verified")]
    AlreadyVerified(Uuid),

    #[error("The confirmation code does not match")]
    InvalidOtp,

    #[error("Closure requires between 2 and 4 resolution images, got {0}")]
    InvalidAttachmentCount(usize),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Complaint {0} was modified by another request, please retry")]
    TransitionConflict(Uuid),

    #[error("Complaint {0} can only be deleted while pending or cancelled")]
    NotDeletable(Uuid),

    #[error("User {0} is not allowed to perform this action")]
    Forbidden(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::ComplaintNotFound(_) | ServiceError::UserNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            ServiceError::NotAnEngineer(_)
            | ServiceError::InvalidOtp
            | ServiceError::InvalidAttachmentCount(_)
            | ServiceError::InvalidTransition(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::NotReassignable(_, _)
            | ServiceError::AlreadyAssigned(_)
            | ServiceError::AlreadyResolved(_)
            | ServiceError::AlreadyVerified(_)
            | ServiceError::TransitionConflict(_)
            | ServiceError::NotDeletable(_) => StatusCode::CONFLICT,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::Database(_) | ServiceError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        let message = match &error {
            // Persistence details stay in the logs, not the response.
            ServiceError::Database(inner) => {
                tracing::error!("database error: {}", inner);
                "Internal server error".to_string()
            }
            _ => error.to_string(),
        };
        HttpError::new(message, status)
    }
}
