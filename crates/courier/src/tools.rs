//! Local capabilities the model can invoke during a turn.
//!
//! Tools are identified by [`ToolKind`]; the wire names only matter at the edge, where
//! [`ToolRegistry`] turns a model's [`ToolCall`] into a typed invocation and the result back
//! into text.
pub mod files;
pub mod search;
pub mod weather;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const SEARCH_URL: &str = "https://duckduckgo.com/html/";

#[derive(
    EnumIter, EnumString, Display, AsRefStr, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "snake_case")]
pub enum ToolKind {
    ListFilesInDir,
    ReadFile,
    EditFile,
    GetWeather,
    SearchWeb,
}

impl ToolKind {
    pub fn tool(&self) -> Tool {
        match self {
            ToolKind::ListFilesInDir => files::list_files_in_dir_tool(),
            ToolKind::ReadFile => files::read_file_tool(),
            ToolKind::EditFile => files::edit_file_tool(),
            ToolKind::GetWeather => weather::get_weather_tool(),
            ToolKind::SearchWeb => search::search_web_tool(),
        }
    }
}

/// What tools need from the outside world
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Relative paths given by the model are resolved against this directory
    pub workdir: PathBuf,
    pub client: Client,
    pub timeout: Duration,
    pub geocoding_url: String,
    pub forecast_url: String,
    pub search_url: String,
}

impl ToolContext {
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
            client: Client::new(),
            timeout: DEFAULT_TOOL_TIMEOUT,
            geocoding_url: GEOCODING_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
            search_url: SEARCH_URL.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_weather_urls<G, F>(mut self, geocoding_url: G, forecast_url: F) -> Self
    where
        G: Into<String>,
        F: Into<String>,
    {
        self.geocoding_url = geocoding_url.into();
        self.forecast_url = forecast_url.into();
        self
    }

    pub fn with_search_url<S: Into<String>>(mut self, search_url: S) -> Self {
        self.search_url = search_url.into();
        self
    }

    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let path = Path::new(path_str);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(".")
    }
}

/// The set of tools one agent may use
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    context: ToolContext,
    kinds: Vec<ToolKind>,
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new(context: ToolContext) -> Self {
        Self::with_tools(context, ToolKind::iter())
    }

    /// A registry limited to `kinds`, kept in the order given
    pub fn with_tools<I>(context: ToolContext, kinds: I) -> Self
    where
        I: IntoIterator<Item = ToolKind>,
    {
        let mut unique: Vec<ToolKind> = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        let tools = unique.iter().map(ToolKind::tool).collect();
        Self {
            context,
            kinds: unique,
            tools,
        }
    }

    pub fn describe(&self) -> &[Tool] {
        &self.tools
    }

    pub fn kinds(&self) -> &[ToolKind] {
        &self.kinds
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> ToolResult<String> {
        let kind = ToolKind::from_str(name)
            .ok()
            .filter(|kind| self.kinds.contains(kind))
            .ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;

        match tokio::time::timeout(self.context.timeout, self.run(kind, arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(self.context.timeout)),
        }
    }

    async fn run(&self, kind: ToolKind, arguments: Value) -> ToolResult<String> {
        let ctx = &self.context;
        match kind {
            ToolKind::ListFilesInDir => files::list_files_in_dir(ctx, parse_arguments(arguments)?).await,
            ToolKind::ReadFile => files::read_file(ctx, parse_arguments(arguments)?).await,
            ToolKind::EditFile => files::edit_file(ctx, parse_arguments(arguments)?).await,
            ToolKind::GetWeather => weather::get_weather(ctx, parse_arguments(arguments)?).await,
            ToolKind::SearchWeb => search::search_web(ctx, parse_arguments(arguments)?).await,
        }
    }

    /// Decode the raw argument string of a tool call.
    ///
    /// Anything that is not a JSON object becomes `{}` so the call still runs and the tool
    /// reports what is missing.
    pub fn decode_arguments(raw: &str) -> Value {
        if raw.trim().is_empty() {
            return json!({});
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                tracing::warn!(arguments = %raw, "tool arguments are not an object: {}", other);
                json!({})
            }
            Err(e) => {
                tracing::warn!(arguments = %raw, "failed to decode tool arguments: {}", e);
                json!({})
            }
        }
    }

    /// Run one call and describe the outcome as text for the model.
    ///
    /// Returns the decoded arguments alongside the text.
    pub async fn dispatch(&self, call: &ToolCall) -> (Value, String) {
        let arguments = Self::decode_arguments(&call.arguments);
        let text = match self.execute(&call.name, arguments.clone()).await {
            Ok(output) => output,
            Err(e @ ToolError::ToolNotFound(_)) | Err(e @ ToolError::Timeout(_)) => e.to_string(),
            Err(e) => format!("Error executing tool: {}", e),
        };
        (arguments, text)
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> ToolResult<T> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidParameters(e.to_string()))
}
