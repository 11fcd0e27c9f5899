// src/mail/sendmail.rs
use serde_json::json;
use std::fs;
use tokio::time::{sleep, Duration};

use crate::config::Config;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 1000;
const RESEND_URL: &str = "https://api.resend.com/emails";

/// Fills `{{placeholder}}` slots in an HTML template.
pub fn render_template(template: &str, placeholders: &[(String, String)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in placeholders {
        rendered = rendered.replace(key, value);
    }
    rendered
}

/// Outbound mail transport over the Resend HTTP API. Credentials come from
/// `Config`, so a misconfigured key surfaces before the first send is
/// attempted, not halfway through a retry loop.
#[derive(Debug, Clone)]
pub struct Mailer {
    api_key: String,
    from_email: String,
    client: reqwest::Client,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            api_key: config.resend_api_key.clone(),
            from_email: config.from_email.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        template_path: &str,
        placeholders: &[(String, String)],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if to_email.is_empty() || !to_email.contains('@') {
            return Err(format!("Invalid email address: {}", to_email).into());
        }
        if self.api_key.is_empty() {
            return Err("Mail API key is not configured".into());
        }

        let template = fs::read_to_string(template_path).map_err(|e| {
            tracing::error!("Failed to read email template {}: {}", template_path, e);
            format!("Template not found: {}", template_path)
        })?;
        let html_body = render_template(&template, placeholders);

        let mut last_error = None;
        for attempt in 1..=MAX_RETRIES {
            match self.post_to_resend(to_email, subject, &html_body).await {
                Ok(email_id) => {
                    tracing::info!("Email sent to {} (id: {})", to_email, email_id);
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < MAX_RETRIES {
                        let delay = RETRY_DELAY_MS * 2_u64.pow(attempt - 1);
                        tracing::warn!(
                            "Email send attempt {} failed for {}, retrying in {}ms",
                            attempt,
                            to_email,
                            delay
                        );
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        let message = format!(
            "Failed after {} attempts: {}",
            MAX_RETRIES,
            last_error.unwrap_or_else(|| "unknown send error".to_string())
        );
        tracing::error!("Email failed for {}: {}", to_email, message);
        Err(message.into())
    }

    async fn post_to_resend(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, String> {
        let response = self
            .client
            .post(RESEND_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "from": self.from_email,
                "to": to_email,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "No response body".to_string());

        if status.is_success() {
            let id = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
                .unwrap_or_else(|| "success".to_string());
            Ok(id)
        } else {
            Err(format!("Resend API error ({}): {}", status.as_u16(), body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_key: &str) -> Config {
        Config {
            database_url: "postgres://localhost/ispdesk".to_string(),
            jwt_secret: "test-secret".to_string(),
            port: 8000,
            resend_api_key: api_key.to_string(),
            from_email: "ISP Desk <noreply@ispdesk.example>".to_string(),
        }
    }

    #[test]
    fn template_placeholders_are_all_replaced() {
        let template = "Hi {{name}}, code {{code}} for {{name}}";
        let rendered = render_template(
            template,
            &[
                ("{{name}}".to_string(), "Ada".to_string()),
                ("{{code}}".to_string(), "0421".to_string()),
            ],
        );
        assert_eq!(rendered, "Hi Ada, code 0421 for Ada");
        assert!(!rendered.contains("{{"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected_before_any_network_call() {
        let mailer = Mailer::new(&test_config("key"));
        assert!(mailer.send_email("", "subject", "nope.html", &[]).await.is_err());
        assert!(mailer
            .send_email("not-an-address", "subject", "nope.html", &[])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn missing_api_key_fails_fast() {
        let mailer = Mailer::new(&test_config(""));
        let err = mailer
            .send_email("a@b.example", "subject", "nope.html", &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
