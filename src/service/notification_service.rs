// services/notification_service.rs
use crate::{
    mail::{mails::send_resolution_otp_email, sendmail::Mailer},
    service::error::ServiceError,
};

/// Outbound customer notifications. Dispatch is best-effort: the closure
/// transaction never waits on or rolls back for a failed send.
#[derive(Debug, Clone)]
pub struct NotificationService {
    mailer: Mailer,
}

impl NotificationService {
    pub fn new(mailer: Mailer) -> Self {
        Self { mailer }
    }

    pub async fn send_resolution_otp(
        &self,
        to_email: &str,
        customer_name: &str,
        ticket_code: &str,
        otp: &str,
    ) -> Result<(), ServiceError> {
        send_resolution_otp_email(&self.mailer, to_email, customer_name, ticket_code, otp)
            .await
            .map_err(|e| ServiceError::Notification(e.to_string()))
    }

    /// Fire-and-forget variant used from the closure path. Failures are
    /// logged and independently retryable by the mail layer.
    pub fn dispatch_resolution_otp(
        &self,
        to_email: String,
        customer_name: String,
        ticket_code: String,
        otp: String,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service
                .send_resolution_otp(&to_email, &customer_name, &ticket_code, &otp)
                .await
            {
                tracing::error!(
                    "failed to send resolution OTP for {} to {}: {}",
                    ticket_code,
                    to_email,
                    e
                );
            }
        });
    }
}
