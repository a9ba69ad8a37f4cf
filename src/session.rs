use tracing::{debug, info};

use crate::agent::{AgentId, RunError};
use crate::catalog::ROUTER_REFUSAL;
use crate::ctx::SessionContext;
use crate::graph::AgentGraph;
use crate::message::Message;
use crate::render::{item_line, refusal_line};
use crate::runner::{RunItem, RunOutcome, Runner};

/// What one line of user input led to.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// The runner completed; history and current agent were committed.
    Answered { items: Vec<RunItem> },
    /// A guardrail refused the input. Nothing was committed.
    Refused { agent: AgentId, message: String },
    /// Blank input. Nothing was sent.
    Ignored,
}

impl Turn {
    /// Console lines for this turn, in display order.
    pub fn lines(&self, graph: &AgentGraph) -> Vec<String> {
        match self {
            Turn::Answered { items } => items.iter().map(|item| item_line(graph, item)).collect(),
            Turn::Refused { agent, message } => vec![refusal_line(graph.name_of(agent), message)],
            Turn::Ignored => Vec::new(),
        }
    }
}

/// The conversation state the console loop owns.
///
/// History only grows, and only when a turn completes. A refused or failed
/// turn leaves history, current agent and context exactly as they were.
#[derive(Debug, Clone)]
pub struct Session {
    current: AgentId,
    history: Vec<Message>,
    context: SessionContext,
}

impl Session {
    pub fn new(start: AgentId, context: SessionContext) -> Self {
        Self {
            current: start,
            history: Vec::new(),
            context,
        }
    }

    pub fn current_agent(&self) -> AgentId {
        self.current
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Send one line to the current agent.
    ///
    /// Guardrail rejections come back as [`Turn::Refused`]; every other error
    /// is returned and is fatal to the console loop.
    pub fn submit(&mut self, runner: &Runner, line: &str) -> Result<Turn, RunError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Turn::Ignored);
        }

        let mut input = self.history.clone();
        input.push(Message::user(line));

        // Tools write to a scratch copy; it replaces the real context only
        // when the turn is committed.
        let mut context = self.context.clone();

        debug!(agent = self.current, history = input.len(), "invoking");
        match runner.run(self.current, &input, &mut context) {
            Ok(RunOutcome::Completed(result)) => {
                if result.last_agent != self.current {
                    info!(from = self.current, to = result.last_agent, "current agent changed");
                }
                self.history = result.history;
                self.current = result.last_agent;
                self.context = context;
                Ok(Turn::Answered {
                    items: result.new_items,
                })
            }
            Ok(RunOutcome::Blocked(block)) => Ok(Turn::Refused {
                agent: block.agent,
                message: block.reason,
            }),
            Err(RunError::GuardrailTripwire { guardrail, reason }) => {
                debug!(guardrail, %reason, "guardrail tripwire");
                Ok(Turn::Refused {
                    agent: runner.graph().start(),
                    message: ROUTER_REFUSAL.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, CITY_INFO, CITY_REFUSAL, FLIGHT_FINDER, ROUTER};
    use crate::guardrail::Classifier;
    use crate::testing::ScriptedModel;
    use crate::tools::WebSearch;
    use std::sync::Arc;

    fn runner(model: ScriptedModel) -> Runner {
        Runner::new(
            catalog::travel_desk().unwrap(),
            catalog::toolbox(WebSearch::default()),
            Arc::new(model),
        )
    }

    fn session() -> Session {
        Session::new(ROUTER, SessionContext::new().with_first_name("James"))
    }

    #[test]
    fn weather_question_hands_off_and_calls_tool() {
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::TripPlanning, false, "not travel")
                .with_verdict(Classifier::CityInfo, true, "weather")
                .then_call("c1", "transfer_to_city_info", "{}")
                .then_call("c2", "get_city_weather", r#"{"city":"Tokyo"}"#)
                .then_text("The weather in Tokyo is sunny, James."),
        );
        let mut session = session();

        let turn = session
            .submit(&runner, "What's the weather in Tokyo?")
            .unwrap();

        assert_eq!(session.current_agent(), CITY_INFO);
        assert_eq!(session.context().city(), Some("Tokyo"));
        assert_eq!(session.history().len(), 6);
        assert_eq!(
            session.history()[0],
            Message::user("What's the weather in Tokyo?")
        );

        let lines = turn.lines(runner.graph());
        let handoff_lines: Vec<_> = lines
            .iter()
            .filter(|l| l.starts_with("Handed off from"))
            .collect();
        assert_eq!(handoff_lines.len(), 1);
        assert!(handoff_lines[0].contains("Router Agent"));
        assert!(handoff_lines[0].contains("City Info Agent"));

        let last = lines.last().unwrap();
        assert!(last.contains("Tokyo") && last.contains("sunny") && last.contains("James"));
    }

    #[test]
    fn off_topic_input_is_refused_without_commit() {
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::TripPlanning, false, "joke")
                .with_verdict(Classifier::CityInfo, false, "joke"),
        );
        let mut session = session();

        let turn = session.submit(&runner, "Tell me a joke").unwrap();

        assert_eq!(
            turn,
            Turn::Refused {
                agent: ROUTER,
                message: ROUTER_REFUSAL.into()
            }
        );
        assert!(session.history().is_empty());
        assert_eq!(session.current_agent(), ROUTER);
        assert_eq!(
            turn.lines(runner.graph()),
            vec![format!("\x1b[91mRouter Agent\x1b[0m: {ROUTER_REFUSAL}")]
        );
    }

    #[test]
    fn repeated_refusal_is_stable() {
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::TripPlanning, false, "joke")
                .with_verdict(Classifier::CityInfo, false, "joke")
                .with_verdict(Classifier::TripPlanning, false, "joke")
                .with_verdict(Classifier::CityInfo, false, "joke"),
        );
        let mut context = SessionContext::new().with_first_name("James");
        context.set_city("Oslo");
        let mut session = Session::new(ROUTER, context);

        let first = session.submit(&runner, "Tell me a joke").unwrap();
        let second = session.submit(&runner, "Tell me a joke").unwrap();

        assert_eq!(first, second);
        assert_eq!(session.context().city(), Some("Oslo"));
        assert_eq!(session.context().first_name(), Some("James"));
        assert!(session.history().is_empty());
    }

    #[test]
    fn one_matching_classifier_is_enough() {
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::TripPlanning, true, "flights")
                .with_verdict(Classifier::CityInfo, false, "no city")
                .then_text("Where would you like to fly?"),
        );
        let mut session = session();

        let turn = session.submit(&runner, "I need a flight").unwrap();
        assert!(matches!(turn, Turn::Answered { .. }));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn specialist_soft_block_keeps_state() {
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::TripPlanning, false, "-")
                .with_verdict(Classifier::CityInfo, true, "weather")
                .then_call("c1", "transfer_to_city_info", "{}")
                .then_text("Which city?")
                .with_verdict(Classifier::CityInfo, false, "flight booking"),
        );
        let mut session = session();
        session.submit(&runner, "What's the weather like?").unwrap();
        assert_eq!(session.current_agent(), CITY_INFO);
        let before = session.history().len();

        let turn = session.submit(&runner, "Book me a flight to Rome").unwrap();

        assert_eq!(
            turn,
            Turn::Refused {
                agent: CITY_INFO,
                message: CITY_REFUSAL.into()
            }
        );
        assert_eq!(session.history().len(), before);
        assert_eq!(session.current_agent(), CITY_INFO);
    }

    #[test]
    fn malformed_specialist_verdict_uses_fixed_refusal() {
        let runner = runner(ScriptedModel::new().with_raw_verdict(Classifier::TripPlanning, "??"));
        let mut session = Session::new(FLIGHT_FINDER, SessionContext::new());

        let turn = session.submit(&runner, "Flights to Lima").unwrap();
        assert_eq!(
            turn,
            Turn::Refused {
                agent: ROUTER,
                message: ROUTER_REFUSAL.into()
            }
        );
        assert_eq!(session.current_agent(), FLIGHT_FINDER);
    }

    #[test]
    fn transport_failure_is_fatal_and_commits_nothing() {
        let runner = runner(ScriptedModel::new());
        let mut session = session();

        let err = session.submit(&runner, "Weather in Paris?").unwrap_err();
        assert!(matches!(err, RunError::Transient(_)));
        assert!(session.history().is_empty());
    }

    #[test]
    fn failed_turn_discards_tool_side_effects() {
        // the weather tool runs, then the model script runs dry
        let runner = runner(
            ScriptedModel::new()
                .with_verdict(Classifier::CityInfo, true, "weather")
                .then_call("c1", "get_city_weather", r#"{"city":"Paris"}"#),
        );
        let mut session = Session::new(CITY_INFO, SessionContext::new());

        assert!(session.submit(&runner, "Weather in Paris?").is_err());
        assert_eq!(session.context().city(), None);
    }

    #[test]
    fn blank_input_is_ignored() {
        let runner = runner(ScriptedModel::new());
        let mut session = session();
        assert_eq!(session.submit(&runner, "   ").unwrap(), Turn::Ignored);
        assert!(runner.graph().contains(ROUTER));
        assert!(Turn::Ignored.lines(runner.graph()).is_empty());
    }
}
