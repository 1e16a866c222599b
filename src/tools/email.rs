//! Simulated email delivery.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{required_str, status_payload, Tool, ToolContext};

/// Sends an email on behalf of the user. Logged, never delivered.
pub struct SendEmail;

#[async_trait]
impl Tool for SendEmail {
    fn name(&self) -> &str {
        "sendEmail"
    }

    fn description(&self) -> &str {
        "Draft and send an email to a recipient. Use this for communication tasks."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Email address of the recipient"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line of the email"
                },
                "body": {
                    "type": "string",
                    "description": "The content/body of the email"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(
        &self,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> anyhow::Result<Map<String, Value>> {
        let to = required_str(args, "to")?;
        let subject = required_str(args, "subject")?;
        let body = required_str(args, "body")?;

        tracing::info!(
            from = %ctx.user_email,
            to = %to,
            body_len = body.len(),
            "Simulated email: {}",
            subject
        );

        Ok(status_payload(
            "success",
            &format!(
                "[SIMULATION] Email sent FROM {} TO {} with subject \"{}\".",
                ctx.user_email, to, subject
            ),
        ))
    }
}
