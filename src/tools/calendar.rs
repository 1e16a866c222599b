//! Simulated calendar scheduling.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde_json::{json, Map, Value};

use super::{required_str, status_payload, Tool, ToolContext};

/// Books a calendar block for the user. Logged, never written anywhere.
pub struct ScheduleEvent;

#[async_trait]
impl Tool for ScheduleEvent {
    fn name(&self) -> &str {
        "scheduleEvent"
    }

    fn description(&self) -> &str {
        "Schedule an event, meeting, or reminder on the user's calendar."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Title of the event"
                },
                "dateTime": {
                    "type": "string",
                    "description": "ISO 8601 date time string (e.g. 2024-10-25T14:00:00)"
                },
                "durationMinutes": {
                    "type": "number",
                    "description": "Duration in minutes"
                }
            },
            "required": ["title", "dateTime", "durationMinutes"]
        })
    }

    async fn execute(
        &self,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> anyhow::Result<Map<String, Value>> {
        let title = required_str(args, "title")?;
        let date_time = required_str(args, "dateTime")?;
        let duration = args
            .get("durationMinutes")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| anyhow::anyhow!("Missing 'durationMinutes' argument"))?;

        if !is_iso_datetime(date_time) {
            return Err(anyhow::anyhow!(
                "Invalid dateTime '{}': expected ISO 8601",
                date_time
            ));
        }
        if !(duration > 0.0) {
            return Err(anyhow::anyhow!(
                "durationMinutes must be positive, got {}",
                duration
            ));
        }

        let minutes = if duration.fract() == 0.0 {
            format!("{}", duration as i64)
        } else {
            format!("{}", duration)
        };

        tracing::info!(organizer = %ctx.user_name, "Simulated calendar event: {}", title);

        Ok(status_payload(
            "success",
            &format!(
                "[SIMULATION] Calendar Event for {}: \"{}\" scheduled for {} ({} min).",
                ctx.user_name, title, date_time, minutes
            ),
        ))
    }
}

/// Accepts RFC 3339 and offset-less forms with or without seconds.
fn is_iso_datetime(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
}
