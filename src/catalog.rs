//! The travel desk itself: three agents, their guardrails and their tools.

use crate::agent::{AgentId, AgentSpec};
use crate::graph::{AgentGraph, GraphError};
use crate::guardrail::{Classifier, InputGuardrail};
use crate::tools::{CityWeather, Toolbox, WebSearch};

pub const ROUTER: AgentId = "router";
pub const CITY_INFO: AgentId = "city_info";
pub const FLIGHT_FINDER: AgentId = "flight_finder";

pub const ROUTER_REFUSAL: &str =
    "I'm sorry, I can only assist with flight planning and city-related questions.";
pub const CITY_REFUSAL: &str = "I'm sorry, I can only assist with city-related information.";
pub const FLIGHT_REFUSAL: &str = "I'm sorry, I can only assist with flight planning requests.";

/// Prepended to every agent's instructions so it knows handoffs exist.
pub const HANDOFF_PREAMBLE: &str = "# System context\n\
You are part of a multi-agent system designed to make agent coordination and execution easy. \
Agents hand off a conversation to one another using handoff functions, which are named \
`transfer_to_<agent>`. Handoffs happen seamlessly in the background; do not mention or draw \
attention to them in your conversation with the user.\n";

const ROUTER_INSTRUCTIONS: &str = "You are a helpful routing agent. You can use your tools to \
delegate questions to other appropriate agents.";

const CITY_INSTRUCTIONS: &str = "You are a city info agent. If you are speaking to a customer, \
you were likely transferred from the triage agent.
Use the following routine to support the customer.
# Routine
1. Ask for the city name if not clear from the context.
2. Use the web search tool to get information about restaurants in the city.
3. Use the weather tool to get the live weather in the city, use your knowledge for climate questions.
4. If the customer asks a question that is not related to the routine, transfer back to the triage agent.";

const FLIGHT_INSTRUCTIONS: &str = "You are a flight finder agent. If you are speaking to a \
customer, you were likely transferred from the triage agent.
Use the following routine to support the customer.
# Routine
1. Ask for the city name if not clear.
2. Use the web search tool to get information about flights to the city.
3. If the customer asks a question that is not related to the routine, transfer back to the triage agent.";

fn with_preamble(instructions: &str) -> String {
    format!("{HANDOFF_PREAMBLE}\n{instructions}")
}

pub fn router_agent() -> AgentSpec {
    AgentSpec::new(ROUTER, "Router Agent")
        .handoff_description(
            "A triage agent that can delegate a customer's request to the appropriate agent.",
        )
        .instructions(with_preamble(ROUTER_INSTRUCTIONS))
        .guardrail(InputGuardrail::AnyOf {
            name: "router_guardrail",
            classifiers: vec![Classifier::TripPlanning, Classifier::CityInfo],
            refusal: ROUTER_REFUSAL,
        })
        .handoff(CITY_INFO)
        .handoff(FLIGHT_FINDER)
}

pub fn city_info_agent() -> AgentSpec {
    AgentSpec::new(CITY_INFO, "City Info Agent")
        .handoff_description("A helpful agent that can answer questions about a city.")
        .instructions(with_preamble(CITY_INSTRUCTIONS))
        .model("gpt-4o")
        .guardrail(InputGuardrail::Require {
            name: "city_info_guardrail",
            classifier: Classifier::CityInfo,
            refusal: CITY_REFUSAL,
        })
        .tool("web_search")
        .tool("get_city_weather")
        .handoff(ROUTER)
}

pub fn flight_finder_agent() -> AgentSpec {
    AgentSpec::new(FLIGHT_FINDER, "Flight Finder Agent")
        .handoff_description("A helpful agent that can find flights for a customer.")
        .instructions(with_preamble(FLIGHT_INSTRUCTIONS))
        .model("gpt-4o-mini")
        .guardrail(InputGuardrail::Require {
            name: "trip_planning_guardrail",
            classifier: Classifier::TripPlanning,
            refusal: FLIGHT_REFUSAL,
        })
        .tool("web_search")
        .handoff(ROUTER)
}

/// Router plus both specialists, entered at the router.
pub fn travel_desk() -> Result<AgentGraph, GraphError> {
    AgentGraph::builder()
        .register(router_agent())
        .register(city_info_agent())
        .register(flight_finder_agent())
        .start_at(ROUTER)
        .build()
}

pub fn toolbox(search: WebSearch) -> Toolbox {
    Toolbox::new().register(search).register(CityWeather)
}
