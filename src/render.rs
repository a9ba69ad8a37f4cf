//! Console formatting of run items.

use crate::graph::AgentGraph;
use crate::runner::RunItem;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const MAGENTA: &str = "\x1b[95m";
const CYAN: &str = "\x1b[96m";

fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}{RESET}")
}

/// One console line for `item`.
pub fn item_line(graph: &AgentGraph, item: &RunItem) -> String {
    match item {
        RunItem::Message { agent, text } => {
            format!("{}: {text}", paint(BLUE, graph.name_of(agent)))
        }
        RunItem::Handoff { source, target } => format!(
            "Handed off from {} to {}",
            paint(GREEN, graph.name_of(source)),
            paint(YELLOW, graph.name_of(target))
        ),
        RunItem::ToolCall { agent, .. } => {
            format!("{}: Calling a tool", paint(MAGENTA, graph.name_of(agent)))
        }
        RunItem::ToolCallOutput { agent, output } => format!(
            "{}: Tool call output: {output}",
            paint(CYAN, graph.name_of(agent))
        ),
    }
}

/// A refusal, attributed to `agent_name`.
pub fn refusal_line(agent_name: &str, message: &str) -> String {
    format!("{}: {message}", paint(RED, agent_name))
}
