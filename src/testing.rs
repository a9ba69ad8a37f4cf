//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::json;

use crate::agent::RunError;
use crate::guardrail::Classifier;
use crate::message::ToolCall;
use crate::model::{ModelClient, ModelRequest, ModelResponse};

/// A [`ModelClient`] that replays canned answers and records every request.
///
/// Classifier requests (those carrying a response format) are answered from a
/// per-classifier queue so concurrent guardrail calls stay deterministic.
/// Everything else is answered from one FIFO. An empty queue answers with a
/// transient error.
#[derive(Default)]
pub struct ScriptedModel {
    verdicts: Mutex<HashMap<&'static str, VecDeque<String>>>,
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verdict(self, classifier: Classifier, matches: bool, reasoning: &str) -> Self {
        let field = classifier.verdict_field();
        let text = json!({
            field: matches,
            "reasoning": reasoning,
        })
        .to_string();
        self.with_raw_verdict(classifier, &text)
    }

    pub fn with_raw_verdict(self, classifier: Classifier, text: &str) -> Self {
        self.verdicts
            .lock()
            .unwrap()
            .entry(classifier.schema_name())
            .or_default()
            .push_back(text.to_string());
        self
    }

    pub fn then_text(self, text: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ModelResponse::text(text));
        self
    }

    pub fn then_call(self, id: &str, name: &str, arguments: &str) -> Self {
        self.then_calls(vec![ToolCall::function(id, name, arguments)])
    }

    pub fn then_calls(self, calls: Vec<ToolCall>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(ModelResponse::tool_calls(calls));
        self
    }

    pub fn then_response(self, response: ModelResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that were not guardrail classifications.
    pub fn agent_requests(&self) -> Vec<ModelRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.response_format.is_none())
            .collect()
    }
}

impl ModelClient for ScriptedModel {
    fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, RunError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(format) = &request.response_format {
            let mut verdicts = self.verdicts.lock().unwrap();
            return verdicts
                .get_mut(format.name.as_str())
                .and_then(|queue| queue.pop_front())
                .map(ModelResponse::text)
                .ok_or_else(|| RunError::transient(format!("no scripted verdict for {}", format.name)));
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RunError::transient("model script exhausted"))
    }
}
