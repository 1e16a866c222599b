//! Simulated weather lookup.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Map, Value};

use super::{required_str, Tool, ToolContext};

const CONDITIONS: [&str; 6] = [
    "Clear Sky",
    "Overcast",
    "Light Rain",
    "Windy",
    "Sunny",
    "Thunderstorms",
];

/// Current conditions for a location. No network access.
pub struct GetCurrentWeather;

#[async_trait]
impl Tool for GetCurrentWeather {
    fn name(&self) -> &str {
        "getCurrentWeather"
    }

    fn description(&self) -> &str {
        "Get the current weather forecast and conditions for a specific location."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city and state, e.g. San Francisco, CA"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(
        &self,
        args: &Map<String, Value>,
        _ctx: &ToolContext,
    ) -> anyhow::Result<Map<String, Value>> {
        let location = required_str(args, "location")?;

        let (temp, condition) = {
            let mut rng = rand::thread_rng();
            let temp: i32 = rng.gen_range(10..30);
            let condition = CONDITIONS.choose(&mut rng).copied().unwrap_or("Clear Sky");
            (temp, condition)
        };

        let mut result = Map::new();
        result.insert(
            "result".to_string(),
            json!(format!(
                "Current weather in {}: {}°C, {}. Humidity: 65%. Wind: 12km/h.",
                location, temp, condition
            )),
        );
        Ok(result)
    }
}
