//! A travel desk built from cooperating LLM agents.
//!
//! A router agent triages each user message behind an input guardrail and
//! hands the conversation to a city-info or flight-finder specialist. The
//! specialists call tools (web search, weather) and hand back to the router
//! when the user drifts off their routine.
//!
//! Agents are plain configuration ([`AgentSpec`]) collected into an
//! [`AgentGraph`]. The [`Runner`] executes one invocation against any
//! [`ModelClient`]; the [`Session`] owns the conversation between invocations
//! and only commits a turn that completed.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use travel_desk::{catalog, OpenAiClient, OpenAiConfig, Runner, Session, SessionContext, WebSearch};
//!
//! let model = Arc::new(OpenAiClient::new(OpenAiConfig::new("sk-...")));
//! let runner = Runner::new(
//!     catalog::travel_desk().unwrap(),
//!     catalog::toolbox(WebSearch::default()),
//!     model,
//! );
//!
//! let mut session = Session::new(catalog::ROUTER, SessionContext::new().with_first_name("James"));
//! let turn = session.submit(&runner, "What's the weather in Tokyo?").unwrap();
//! for line in turn.lines(runner.graph()) {
//!     println!("{line}");
//! }
//! ```

mod agent;
pub mod catalog;
pub mod config;
mod ctx;
mod graph;
pub mod guardrail;
mod message;
mod model;
pub mod openai;
pub mod render;
mod runner;
mod session;
pub mod tools;

#[cfg(test)]
mod testing;

pub use agent::{AgentId, AgentSpec, RunError};
pub use config::{Config, ConfigError, Overrides};
pub use ctx::SessionContext;
pub use graph::{AgentGraph, AgentGraphBuilder, GraphError};
pub use guardrail::{Classifier, GuardrailOutcome, GuardrailVerdict, InputGuardrail};
pub use message::{FunctionCall, Message, ToolCall};
pub use model::{ModelClient, ModelRequest, ModelResponse, ResponseFormat, ToolDefinition};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use runner::{ErrorEvent, GuardrailBlock, ItemEvent, RunItem, RunOutcome, RunResult, Runner};
pub use session::{Session, Turn};
pub use tools::{CityWeather, Tool, Toolbox, WebSearch};
