//! Functions agents can call, plus small helpers they share.

pub mod http;
pub mod parse;
pub mod search;
pub mod weather;

use std::collections::BTreeMap;

use crate::agent::RunError;
use crate::ctx::SessionContext;
use crate::model::ToolDefinition;

pub use http::http_get;
pub use parse::{extract_json, strip_code_fences};
pub use search::WebSearch;
pub use weather::{CityWeather, city_weather};

/// A function tool the model can invoke.
///
/// Tools receive the session context by `&mut` so their side effects are
/// visible to every later step of the same turn.
pub trait Tool: Send + Sync {
    /// Name exposed to the model. Must be unique within a [`Toolbox`].
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema for the argument object.
    fn parameters(&self) -> serde_json::Value;

    fn call(&self, args: &serde_json::Value, ctx: &mut SessionContext) -> Result<String, RunError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Every tool the runner can dispatch to, keyed by name.
#[derive(Default)]
pub struct Toolbox {
    tools: BTreeMap<&'static str, Box<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.insert(tool.name(), Box::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions for the named tools, skipping names that are not registered.
    pub fn definitions(&self, names: &[&'static str]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .map(|tool| tool.definition())
            .collect()
    }
}

/// Read a required string argument.
pub(crate) fn string_arg<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, RunError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RunError::invalid(format!("missing string argument '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toolbox_lists_only_requested_definitions() {
        let toolbox = Toolbox::new().register(CityWeather);
        let defs = toolbox.definitions(&["get_city_weather", "not_registered"]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "get_city_weather");
        assert_eq!(defs[0].parameters["required"], json!(["city"]));
    }

    #[test]
    fn toolbox_lookup_by_name() {
        let toolbox = Toolbox::new().register(CityWeather);
        assert!(toolbox.contains("get_city_weather"));
        assert!(toolbox.get("web_search").is_none());
    }

    #[test]
    fn string_arg_rejects_missing_and_non_string() {
        let args = json!({"city": 3});
        assert!(string_arg(&args, "city").is_err());
        assert!(string_arg(&args, "other").is_err());
        assert_eq!(string_arg(&json!({"city": "Oslo"}), "city").unwrap(), "Oslo");
    }
}
