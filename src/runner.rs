use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::agent::{AgentId, AgentSpec, RunError};
use crate::ctx::SessionContext;
use crate::graph::{AgentGraph, handoff_tool_name};
use crate::message::{Message, ToolCall};
use crate::model::{ModelClient, ModelRequest, ToolDefinition};
use crate::tools::Toolbox;

/// Something an invocation produced, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RunItem {
    /// Text the agent said to the user.
    Message { agent: AgentId, text: String },
    /// Conversation moved from `source` to `target`.
    Handoff { source: AgentId, target: AgentId },
    /// The agent called a function tool.
    ToolCall {
        agent: AgentId,
        name: String,
        arguments: String,
    },
    /// A function tool returned.
    ToolCallOutput { agent: AgentId, output: String },
}

impl RunItem {
    /// The agent that produced the item (the source, for handoffs).
    pub fn agent(&self) -> AgentId {
        match self {
            RunItem::Message { agent, .. }
            | RunItem::ToolCall { agent, .. }
            | RunItem::ToolCallOutput { agent, .. } => *agent,
            RunItem::Handoff { source, .. } => *source,
        }
    }
}

/// A completed invocation.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub new_items: Vec<RunItem>,
    /// Agent that produced the final answer; receives the next turn.
    pub last_agent: AgentId,
    /// Input history plus everything this invocation appended.
    pub history: Vec<Message>,
    pub final_output: String,
}

/// A guardrail refused the input without tripping the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailBlock {
    pub agent: AgentId,
    pub guardrail: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunResult),
    Blocked(GuardrailBlock),
}

/// Passed to the `on_item` hook for every item an invocation produces.
pub struct ItemEvent<'a> {
    pub item: &'a RunItem,
    pub turn: usize,
}

/// Passed to the `on_error` hook when an invocation fails.
pub struct ErrorEvent<'a> {
    /// Agent that was active when the invocation failed.
    pub agent: AgentId,
    pub error: &'a RunError,
    /// Model turn that failed; 0 when the failure came before the first
    /// model call (unknown agent, guardrail).
    pub turn: usize,
}

type ItemHook = Box<dyn Fn(&ItemEvent) + Send + Sync>;
type ErrorHook = Box<dyn Fn(&ErrorEvent) + Send + Sync>;

/// Executes one invocation: guardrails, then the model / tool / handoff loop.
pub struct Runner {
    graph: AgentGraph,
    tools: Toolbox,
    model: Arc<dyn ModelClient>,
    max_turns: usize,
    on_item: Option<ItemHook>,
    on_error: Option<ErrorHook>,
}

impl Runner {
    pub fn new(graph: AgentGraph, tools: Toolbox, model: Arc<dyn ModelClient>) -> Self {
        Self {
            graph,
            tools,
            model,
            max_turns: 10,
            on_item: None,
            on_error: None,
        }
    }

    /// Cap on model calls per invocation. Prevents tool-call loops.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Register a callback that fires for each produced item.
    pub fn on_item(mut self, cb: impl Fn(&ItemEvent) + Send + Sync + 'static) -> Self {
        self.on_item = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when an invocation fails.
    pub fn on_error(mut self, cb: impl Fn(&ErrorEvent) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to emit `tracing` events.
    pub fn with_tracing(self) -> Self {
        self.on_item(|e| debug!(turn = e.turn, agent = e.item.agent(), item = ?e.item, "run item"))
            .on_error(|e| warn!(turn = e.turn, agent = e.agent, error = %e.error, "run failed"))
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    /// Run `start` against `input`.
    ///
    /// `input` is the full history, newest user message last. Nothing is
    /// committed anywhere: the caller decides what to keep from the result.
    /// Tools may mutate `ctx`.
    pub fn run(
        &self,
        start: AgentId,
        input: &[Message],
        ctx: &mut SessionContext,
    ) -> Result<RunOutcome, RunError> {
        let mut at = (start, 0);
        let result = self.run_inner(start, input, ctx, &mut at);
        if let Err(err) = &result
            && let Some(cb) = &self.on_error
        {
            let (agent, turn) = at;
            cb(&ErrorEvent {
                agent,
                error: err,
                turn,
            });
        }
        result
    }

    /// `at` tracks the active agent and turn for error reporting.
    fn run_inner(
        &self,
        start: AgentId,
        input: &[Message],
        ctx: &mut SessionContext,
        at: &mut (AgentId, usize),
    ) -> Result<RunOutcome, RunError> {
        let mut current = self.agent(start)?;

        for guardrail in &current.guardrails {
            let outcome = guardrail.evaluate(self.model.as_ref(), input)?;
            if outcome.tripwire {
                return Err(RunError::GuardrailTripwire {
                    guardrail: guardrail.name(),
                    reason: outcome.info,
                });
            }
            if outcome.blocked {
                debug!(agent = current.id, guardrail = guardrail.name(), "input blocked");
                return Ok(RunOutcome::Blocked(GuardrailBlock {
                    agent: current.id,
                    guardrail: guardrail.name(),
                    reason: outcome.info,
                }));
            }
        }

        let mut history = input.to_vec();
        let mut new_items = Vec::new();

        for turn in 1..=self.max_turns {
            *at = (current.id, turn);
            let request = self.request_for(current, &history);
            let response = self.model.complete(&request)?;

            if let Some(text) = response.trimmed_text() {
                self.push_item(
                    &mut new_items,
                    turn,
                    RunItem::Message {
                        agent: current.id,
                        text: text.to_string(),
                    },
                );
            }

            if response.tool_calls.is_empty() {
                // the API rejects an assistant message with neither content nor tool calls
                let final_output = response.content.unwrap_or_default();
                history.push(Message::assistant(final_output.clone()));
                return Ok(RunOutcome::Completed(RunResult {
                    new_items,
                    last_agent: current.id,
                    history,
                    final_output,
                }));
            }

            history.push(Message::Assistant {
                content: response.content.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            let mut handed_to: Option<AgentId> = None;
            for call in &response.tool_calls {
                if let Some(target) = self.graph.handoff_target(current, call.name()) {
                    if handed_to.is_some() {
                        history.push(Message::tool(
                            &call.id,
                            "Multiple handoffs detected, ignoring this one.",
                        ));
                        continue;
                    }
                    let target_spec = self.agent(target)?;
                    info!(from = current.id, to = target, "handoff");
                    self.push_item(
                        &mut new_items,
                        turn,
                        RunItem::Handoff {
                            source: current.id,
                            target,
                        },
                    );
                    history.push(Message::tool(
                        &call.id,
                        json!({ "assistant": target_spec.name }).to_string(),
                    ));
                    handed_to = Some(target);
                    continue;
                }

                self.push_item(
                    &mut new_items,
                    turn,
                    RunItem::ToolCall {
                        agent: current.id,
                        name: call.name().to_string(),
                        arguments: call.function.arguments.clone(),
                    },
                );
                let output = self.call_tool(current, call, ctx);
                self.push_item(
                    &mut new_items,
                    turn,
                    RunItem::ToolCallOutput {
                        agent: current.id,
                        output: output.clone(),
                    },
                );
                history.push(Message::tool(&call.id, output));
            }

            if let Some(target) = handed_to {
                current = self.agent(target)?;
            }
        }

        Err(RunError::MaxTurns(self.max_turns))
    }

    fn agent(&self, id: &str) -> Result<&AgentSpec, RunError> {
        self.graph
            .get(id)
            .ok_or_else(|| RunError::invalid(format!("unknown agent: {id}")))
    }

    fn request_for(&self, agent: &AgentSpec, history: &[Message]) -> ModelRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(agent.instructions.clone()));
        messages.extend_from_slice(history);

        ModelRequest::new(messages)
            .with_model(agent.model.clone())
            .with_tools(self.tool_definitions(agent))
    }

    /// Function tools first, then one handoff tool per target.
    fn tool_definitions(&self, agent: &AgentSpec) -> Vec<ToolDefinition> {
        let mut defs = self.tools.definitions(&agent.tools);
        for &target in &agent.handoffs {
            let Some(spec) = self.graph.get(target) else {
                continue;
            };
            defs.push(ToolDefinition {
                name: handoff_tool_name(target),
                description: format!(
                    "Handoff to the {} agent to handle the request. {}",
                    spec.name, spec.handoff_description
                ),
                parameters: json!({
                    "type": "object",
                    "properties": {},
                    "additionalProperties": false
                }),
            });
        }
        defs
    }

    /// Execute a function tool. Failures become the tool's output so the
    /// model can recover; they never abort the invocation.
    fn call_tool(&self, agent: &AgentSpec, call: &ToolCall, ctx: &mut SessionContext) -> String {
        let name = call.name();
        let tool = match self.tools.get(name) {
            Some(tool) if agent.tools.iter().any(|&granted| granted == name) => tool,
            _ => {
                warn!(agent = agent.id, tool = name, "model called an unknown tool");
                return format!("error: unknown tool '{name}'");
            }
        };

        let args = match call.parsed_arguments() {
            Ok(args) => args,
            Err(e) => return format!("error: invalid arguments: {e}"),
        };

        debug!(agent = agent.id, tool = name, "calling tool");
        match tool.call(&args, ctx) {
            Ok(output) => output,
            Err(e) => {
                warn!(agent = agent.id, tool = name, error = %e, "tool failed");
                format!("error: {e}")
            }
        }
    }

    fn push_item(&self, items: &mut Vec<RunItem>, turn: usize, item: RunItem) {
        if let Some(cb) = &self.on_item {
            cb(&ItemEvent { item: &item, turn });
        }
        items.push(item);
    }
}
