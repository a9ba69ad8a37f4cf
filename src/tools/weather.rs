use serde_json::json;
use tracing::debug;

use super::{Tool, string_arg};
use crate::agent::RunError;
use crate::ctx::SessionContext;

/// Record `city` in the context, then report its weather.
///
/// The context is updated before the sentence is built, so anything that runs
/// after this call in the same turn sees the new city. A missing first name
/// renders as `None`.
pub fn city_weather(ctx: &mut SessionContext, city: &str) -> String {
    ctx.set_city(city);
    let first_name = ctx.first_name().unwrap_or("None");
    format!("The weather in {city} is sunny, {first_name}.")
}

/// Deterministic weather stub exposed as `get_city_weather`.
pub struct CityWeather;

impl Tool for CityWeather {
    fn name(&self) -> &'static str {
        "get_city_weather"
    }

    fn description(&self) -> &'static str {
        "Get the weather in a city."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The city to get the weather for."
                }
            },
            "required": ["city"],
            "additionalProperties": false
        })
    }

    fn call(&self, args: &serde_json::Value, ctx: &mut SessionContext) -> Result<String, RunError> {
        let city = string_arg(args, "city")?;
        debug!(city, "weather lookup");
        Ok(city_weather(ctx, city))
    }
}
