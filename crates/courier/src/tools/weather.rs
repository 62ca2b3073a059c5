use serde::Deserialize;
use serde_json::{json, Value};

use super::ToolContext;
use crate::errors::{ToolError, ToolResult};
use crate::models::tool::Tool;

pub fn get_weather_tool() -> Tool {
    Tool::new(
        "get_weather",
        "Get the current temperature in a city using a real weather API",
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "Name of the city (e.g. Madrid, New York)"},
                "unit": {
                    "type": "string",
                    "enum": ["celsius", "fahrenheit"],
                    "description": "Temperature unit"
                }
            },
            "required": ["city"]
        }),
    )
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    fn as_param(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetWeatherArgs {
    pub city: String,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

/// Geocode the city, then read the current temperature from the forecast service
pub async fn get_weather(ctx: &ToolContext, args: GetWeatherArgs) -> ToolResult<String> {
    let geo: Value = ctx
        .client
        .get(&ctx.geocoding_url)
        .query(&[
            ("name", args.city.as_str()),
            ("count", "1"),
            ("language", "en"),
            ("format", "json"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(place) = geo
        .get("results")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
    else {
        return Ok(format!("Could not find the city '{}'", args.city));
    };

    let coordinate = |key: &str| {
        place.get(key).and_then(|v| v.as_f64()).ok_or_else(|| {
            ToolError::ExecutionError(format!("geocoding result has no {}", key))
        })
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;

    let forecast: Value = ctx
        .client
        .get(&ctx.forecast_url)
        .query(&[
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("current", "temperature_2m".to_string()),
            ("timezone", "auto".to_string()),
            ("temperature_unit", args.unit.as_param().to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let temperature = forecast
        .get("current")
        .and_then(|c| c.get("temperature_2m"))
        .filter(|t| t.is_number())
        .ok_or_else(|| {
            ToolError::ExecutionError("forecast has no current temperature".to_string())
        })?;

    Ok(format!(
        "The current temperature in {} is {}{}.",
        args.city,
        temperature,
        args.unit.symbol()
    ))
}
