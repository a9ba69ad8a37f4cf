use crate::guardrail::InputGuardrail;

/// Stable identifier of an agent inside an [`crate::AgentGraph`].
pub type AgentId = &'static str;

/// Declarative configuration of one agent.
///
/// Agents never point at each other directly. Handoff targets are ids that the
/// graph resolves, so a cycle (router -> specialist -> router) needs no
/// post-construction patching.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Unique id, used for handoff routing.
    pub id: AgentId,
    /// Display name shown in console output.
    pub name: &'static str,
    /// Shown to other agents as the description of the handoff tool.
    pub handoff_description: &'static str,
    /// System prompt.
    pub instructions: String,
    /// Model override. `None` uses the client's default model.
    pub model: Option<String>,
    /// Checked in order before the agent's first model call of an invocation.
    pub guardrails: Vec<InputGuardrail>,
    /// Names of tools from the runner's toolbox this agent may call.
    pub tools: Vec<&'static str>,
    /// Agents this one may transfer the conversation to.
    pub handoffs: Vec<AgentId>,
}

impl AgentSpec {
    pub fn new(id: AgentId, name: &'static str) -> Self {
        Self {
            id,
            name,
            handoff_description: "",
            instructions: String::new(),
            model: None,
            guardrails: Vec::new(),
            tools: Vec::new(),
            handoffs: Vec::new(),
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn handoff_description(mut self, description: &'static str) -> Self {
        self.handoff_description = description;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn guardrail(mut self, guardrail: InputGuardrail) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    pub fn tool(mut self, name: &'static str) -> Self {
        self.tools.push(name);
        self
    }

    pub fn handoff(mut self, target: AgentId) -> Self {
        self.handoffs.push(target);
        self
    }

    pub fn can_hand_off_to(&self, target: AgentId) -> bool {
        self.handoffs.contains(&target)
    }
}

/// Error type for an invocation, with variants designed around what the
/// caller can do about them.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Bad input or wiring error. Don't retry, fix the code.
    #[error("invalid: {0}")]
    Invalid(String),
    /// Transient failure (network, rate limit). Retrying might help.
    #[error("transient: {0}")]
    Transient(String),
    /// The model API answered with an error status.
    #[error("model error ({status}): {message}")]
    Model { status: u16, message: String },
    /// An input guardrail blocked the request before any model output.
    #[error("guardrail '{guardrail}' tripped: {reason}")]
    GuardrailTripwire {
        guardrail: &'static str,
        reason: String,
    },
    /// The model kept calling tools without producing a final answer.
    #[error("max turns ({0}) exceeded")]
    MaxTurns(usize),
    /// Everything else. Inspect the message for details.
    #[error("{0}")]
    Other(String),
}

impl From<ureq::Error> for RunError {
    fn from(e: ureq::Error) -> Self {
        RunError::Transient(e.to_string())
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Other(e.to_string())
    }
}

impl From<serde_json::Error> for RunError {
    fn from(e: serde_json::Error) -> Self {
        RunError::Invalid(e.to_string())
    }
}

impl RunError {
    /// Create an [`Invalid`](RunError::Invalid) error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        RunError::Invalid(msg.into())
    }

    /// Create an [`Other`](RunError::Other) error.
    pub fn other(msg: impl Into<String>) -> Self {
        RunError::Other(msg.into())
    }

    /// Create a [`Transient`](RunError::Transient) error.
    pub fn transient(msg: impl Into<String>) -> Self {
        RunError::Transient(msg.into())
    }
}
