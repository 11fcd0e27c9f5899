use super::sendmail::Mailer;

/// Send the resolution confirmation code to the customer after an engineer
/// closes their ticket.
pub async fn send_resolution_otp_email(
    mailer: &Mailer,
    to_email: &str,
    customer_name: &str,
    ticket_code: &str,
    otp_code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = format!("Ticket {} resolved - confirmation code inside", ticket_code);
    let template_path = "src/mail/templates/Resolution-OTP-email.html";
    let placeholders = vec![
        ("{{customer_name}}".to_string(), customer_name.to_string()),
        ("{{ticket_code}}".to_string(), ticket_code.to_string()),
        ("{{otp_code}}".to_string(), otp_code.to_string()),
    ];

    mailer
        .send_email(to_email, &subject, template_path, &placeholders)
        .await
}
