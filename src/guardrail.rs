//! Input guardrails backed by LLM classifiers.
//!
//! A [`Classifier`] asks the model a yes/no question about the conversation and
//! gets back a [`GuardrailVerdict`]. An [`InputGuardrail`] turns one or more
//! verdicts into a [`GuardrailOutcome`] the runner acts on:
//!
//! - `tripwire` aborts the invocation with [`RunError::GuardrailTripwire`]
//! - `blocked` without `tripwire` ends it early with a refusal but no error
//! - neither lets the agent run

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::agent::RunError;
use crate::message::Message;
use crate::model::{ModelClient, ModelRequest, ResponseFormat};
use crate::tools::extract_json;

/// Reported when a classifier's answer does not match its schema.
pub const MALFORMED_VERDICT: &str = "Error: Guardrail response is not formatted correctly.";

/// A classifier's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailVerdict {
    pub matches: bool,
    pub reasoning: String,
}

/// The yes/no questions the guardrails can ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classifier {
    /// Is the user asking for help planning a trip?
    TripPlanning,
    /// Is the user asking about a city (weather, restaurants, landmarks)?
    CityInfo,
}

impl Classifier {
    pub fn name(self) -> &'static str {
        match self {
            Classifier::TripPlanning => "Guardrail check",
            Classifier::CityInfo => "City Guardrail Check",
        }
    }

    pub fn instructions(self) -> &'static str {
        match self {
            Classifier::TripPlanning => {
                "Check if the user is asking a request related to trip planning."
            }
            Classifier::CityInfo => {
                "Check if the user is asking about city-related information \
                 (e.g., weather, restaurants, landmarks)."
            }
        }
    }

    /// Name of the boolean field in the structured answer.
    pub(crate) fn verdict_field(self) -> &'static str {
        match self {
            Classifier::TripPlanning => "is_trip_planning",
            Classifier::CityInfo => "is_city_related",
        }
    }

    pub(crate) fn schema_name(self) -> &'static str {
        match self {
            Classifier::TripPlanning => "trip_planning_guardrail_output",
            Classifier::CityInfo => "city_info_guardrail_output",
        }
    }

    pub fn response_format(self) -> ResponseFormat {
        let field = self.verdict_field();
        ResponseFormat {
            name: self.schema_name().to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    field: { "type": "boolean" },
                    "reasoning": { "type": "string" }
                },
                "required": [field, "reasoning"],
                "additionalProperties": false
            }),
        }
    }

    /// Parse model text into a verdict. `None` means the text did not match
    /// the schema.
    pub fn parse_verdict(self, text: &str) -> Option<GuardrailVerdict> {
        let value: Value = extract_json(text)?;
        let matches = value.get(self.verdict_field())?.as_bool()?;
        let reasoning = value.get("reasoning")?.as_str()?.to_string();
        Some(GuardrailVerdict { matches, reasoning })
    }

    /// Ask the model about `history`.
    ///
    /// `Ok(None)` is a malformed answer; `Err` is a transport or API failure.
    pub fn classify(
        self,
        model: &dyn ModelClient,
        history: &[Message],
    ) -> Result<Option<GuardrailVerdict>, RunError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.instructions()));
        messages.extend_from_slice(history);

        let request = ModelRequest::new(messages).with_response_format(self.response_format());
        let response = model.complete(&request)?;

        let verdict = response
            .content
            .as_deref()
            .and_then(|text| self.parse_verdict(text));

        match &verdict {
            Some(v) => debug!(
                classifier = self.name(),
                matches = v.matches,
                reasoning = %v.reasoning,
                "guardrail verdict"
            ),
            None => warn!(
                classifier = self.name(),
                content = ?response.content,
                "malformed guardrail verdict"
            ),
        }

        Ok(verdict)
    }
}

/// What the runner should do after a guardrail ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailOutcome {
    /// Abort with [`RunError::GuardrailTripwire`].
    pub tripwire: bool,
    /// Stop before the agent runs and show `info` as the refusal.
    pub blocked: bool,
    /// Refusal text, diagnostic, or the classifier's reasoning.
    pub info: String,
}

impl GuardrailOutcome {
    pub fn pass(info: impl Into<String>) -> Self {
        Self {
            tripwire: false,
            blocked: false,
            info: info.into(),
        }
    }

    pub fn soft_block(info: impl Into<String>) -> Self {
        Self {
            tripwire: false,
            blocked: true,
            info: info.into(),
        }
    }

    pub fn tripwire(info: impl Into<String>) -> Self {
        Self {
            tripwire: true,
            blocked: true,
            info: info.into(),
        }
    }
}

/// A guardrail policy attached to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputGuardrail {
    /// Pass if any classifier matches; trip the wire if none do. Every
    /// classifier is evaluated, malformed answers count as no match.
    AnyOf {
        name: &'static str,
        classifiers: Vec<Classifier>,
        refusal: &'static str,
    },
    /// Soft-block unless the classifier matches; trip the wire on a
    /// malformed answer.
    Require {
        name: &'static str,
        classifier: Classifier,
        refusal: &'static str,
    },
}

impl InputGuardrail {
    pub fn name(&self) -> &'static str {
        match self {
            InputGuardrail::AnyOf { name, .. } | InputGuardrail::Require { name, .. } => *name,
        }
    }

    pub fn evaluate(
        &self,
        model: &dyn ModelClient,
        history: &[Message],
    ) -> Result<GuardrailOutcome, RunError> {
        match self {
            InputGuardrail::Require {
                classifier,
                refusal,
                ..
            } => Ok(match classifier.classify(model, history)? {
                None => GuardrailOutcome::tripwire(MALFORMED_VERDICT),
                Some(verdict) if !verdict.matches => GuardrailOutcome::soft_block(*refusal),
                Some(verdict) => GuardrailOutcome::pass(verdict.reasoning),
            }),
            InputGuardrail::AnyOf {
                classifiers,
                refusal,
                ..
            } => {
                let verdicts = classify_all(classifiers, model, history)?;
                let any_match = verdicts.iter().flatten().any(|v| v.matches);
                if any_match {
                    Ok(GuardrailOutcome::pass("Proceed"))
                } else {
                    Ok(GuardrailOutcome::tripwire(*refusal))
                }
            }
        }
    }
}

/// Run every classifier on its own thread and wait for all of them.
fn classify_all(
    classifiers: &[Classifier],
    model: &dyn ModelClient,
    history: &[Message],
) -> Result<Vec<Option<GuardrailVerdict>>, RunError> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = classifiers
            .iter()
            .map(|&classifier| scope.spawn(move || classifier.classify(model, history)))
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(RunError::other("guardrail classifier panicked")))
            })
            .collect()
    })
}
