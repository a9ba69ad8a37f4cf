use crate::agent::{AgentId, AgentSpec};
use std::collections::HashMap;

/// Prefix of the tool name that hands the conversation to another agent.
pub const HANDOFF_TOOL_PREFIX: &str = "transfer_to_";

// ---------------------------------------------------------------------------
// GraphError
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),
    #[error("unknown start agent: {0}")]
    UnknownStart(AgentId),
    #[error("agent '{from}' hands off to unknown agent '{to}'")]
    UnknownHandoff { from: AgentId, to: AgentId },
    #[error("agent graph has no agents")]
    MissingStart,
}

// ---------------------------------------------------------------------------
// AgentGraphBuilder
// ---------------------------------------------------------------------------

pub struct AgentGraphBuilder {
    start: Option<AgentId>,
    order: Vec<AgentId>,
    agents: HashMap<AgentId, AgentSpec>,
    duplicate: Option<AgentId>,
}

impl AgentGraphBuilder {
    pub fn register(mut self, spec: AgentSpec) -> Self {
        let id = spec.id;
        if self.agents.contains_key(id) {
            self.duplicate = Some(id);
        } else {
            self.order.push(id);
        }
        self.agents.insert(id, spec);

        // First registered agent is the default entry point.
        if self.start.is_none() {
            self.start = Some(id);
        }

        self
    }

    pub fn start_at(mut self, id: AgentId) -> Self {
        self.start = Some(id);
        self
    }

    /// Validate and freeze. Every handoff target must be registered, so a
    /// built graph never routes to a missing agent.
    pub fn build(self) -> Result<AgentGraph, GraphError> {
        if let Some(id) = self.duplicate {
            return Err(GraphError::DuplicateAgent(id));
        }

        let start = self.start.ok_or(GraphError::MissingStart)?;
        if !self.agents.contains_key(start) {
            return Err(GraphError::UnknownStart(start));
        }

        for id in &self.order {
            let spec = &self.agents[*id];
            if let Some(&to) = spec
                .handoffs
                .iter()
                .find(|target| !self.agents.contains_key(**target))
            {
                return Err(GraphError::UnknownHandoff { from: spec.id, to });
            }
        }

        Ok(AgentGraph {
            start,
            order: self.order,
            agents: self.agents,
        })
    }
}

// ---------------------------------------------------------------------------
// AgentGraph (validated, only constructed via build())
// ---------------------------------------------------------------------------

/// Arena of agents addressed by id.
#[derive(Debug, Clone)]
pub struct AgentGraph {
    start: AgentId,
    order: Vec<AgentId>,
    agents: HashMap<AgentId, AgentSpec>,
}

impl AgentGraph {
    pub fn builder() -> AgentGraphBuilder {
        AgentGraphBuilder {
            start: None,
            order: Vec::new(),
            agents: HashMap::new(),
            duplicate: None,
        }
    }

    /// The entry agent (the router).
    pub fn start(&self) -> AgentId {
        self.start
    }

    pub fn get(&self, id: &str) -> Option<&AgentSpec> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Display name for `id`, falling back to the id itself.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|spec| spec.name).unwrap_or(id)
    }

    /// Agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentSpec> {
        self.order.iter().map(|id| &self.agents[*id])
    }

    /// Resolve a handoff tool call made by `from` to its target, if `from` is
    /// allowed to hand off there.
    pub fn handoff_target(&self, from: &AgentSpec, tool_name: &str) -> Option<AgentId> {
        let target = tool_name.strip_prefix(HANDOFF_TOOL_PREFIX)?;
        from.handoffs.iter().copied().find(|&id| id == target)
    }
}

/// Name of the tool that hands off to `target`.
pub fn handoff_tool_name(target: AgentId) -> String {
    format!("{HANDOFF_TOOL_PREFIX}{target}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: AgentId) -> AgentSpec {
        AgentSpec::new(id, id)
    }

    #[test]
    fn build_valid_cyclic_graph() {
        let graph = AgentGraph::builder()
            .register(agent("router").handoff("city").handoff("flight"))
            .register(agent("city").handoff("router"))
            .register(agent("flight").handoff("router"))
            .build()
            .unwrap();

        assert_eq!(graph.start(), "router");
        assert!(graph.get("city").unwrap().can_hand_off_to("router"));
        assert!(graph.get("router").unwrap().can_hand_off_to("flight"));
        let ids: Vec<_> = graph.agents().map(|a| a.id).collect();
        assert_eq!(ids, vec!["router", "city", "flight"]);
    }

    #[test]
    fn missing_start_on_empty_builder() {
        let err = AgentGraph::builder().build().unwrap_err();
        assert_eq!(err, GraphError::MissingStart);
    }

    #[test]
    fn unknown_start_at_agent() {
        let err = AgentGraph::builder()
            .register(agent("a"))
            .start_at("missing")
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownStart("missing"));
    }

    #[test]
    fn unknown_handoff_target() {
        let err = AgentGraph::builder()
            .register(agent("router").handoff("ghost"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownHandoff {
                from: "router",
                to: "ghost"
            }
        );
    }

    #[test]
    fn duplicate_agent_rejected() {
        let err = AgentGraph::builder()
            .register(agent("a"))
            .register(agent("a"))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateAgent("a"));
    }

    #[test]
    fn handoff_target_requires_declared_edge() {
        let graph = AgentGraph::builder()
            .register(agent("router").handoff("city"))
            .register(agent("city").handoff("router"))
            .register(agent("flight"))
            .build()
            .unwrap();
        let router = graph.get("router").unwrap();

        assert_eq!(graph.handoff_target(router, "transfer_to_city"), Some("city"));
        assert_eq!(graph.handoff_target(router, "transfer_to_flight"), None);
        assert_eq!(graph.handoff_target(router, "get_city_weather"), None);
    }

    #[test]
    fn name_of_falls_back_to_id() {
        let graph = AgentGraph::builder()
            .register(AgentSpec::new("router", "Router Agent"))
            .build()
            .unwrap();
        assert_eq!(graph.name_of("router"), "Router Agent");
        assert_eq!(graph.name_of("nobody"), "nobody");
    }

    #[test]
    fn handoff_tool_name_uses_prefix() {
        assert_eq!(handoff_tool_name("city_info"), "transfer_to_city_info");
    }
}
