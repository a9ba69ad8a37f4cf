//! OpenAI-compatible Chat Completions client.
//!
//! Works against `https://api.openai.com/v1` or any server exposing the same
//! `POST /chat/completions` shape (Ollama, vLLM, LiteLLM, ...).

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use ureq::Agent;

use crate::agent::RunError;
use crate::message::ToolCall;
use crate::model::{ModelClient, ModelRequest, ModelResponse, ToolDefinition};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    http: Agent,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let http_config = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();

        Self {
            config,
            http: http_config.into(),
        }
    }

    /// Build the JSON request body for `/chat/completions`.
    fn request_body(&self, request: &ModelRequest) -> Value {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let mut body = json!({
            "model": model,
            "messages": request.messages,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(to_openai_tool).collect();
            body["tools"] = json!(tools);
        }

        if let Some(format) = &request.response_format {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": format.name,
                    "schema": format.schema,
                    "strict": true,
                }
            });
        }

        body
    }
}

impl ModelClient for OpenAiClient {
    fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, RunError> {
        let body = self.request_body(request);
        debug!(
            model = %body["model"],
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending chat completion"
        );

        let mut response = self
            .http
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send_json(&body)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.body_mut().read_to_string()?;
            return Err(RunError::Model {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let json: Value = response.body_mut().read_json()?;
        parse_completion(json)
    }
}

/// Convert a tool definition to the Chat Completions `tools` entry.
pub fn to_openai_tool(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

fn parse_completion(json: Value) -> Result<ModelResponse, RunError> {
    let completion: Completion = serde_json::from_value(json)?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RunError::invalid("completion has no choices"))?;

    Ok(ModelResponse {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
