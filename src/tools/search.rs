use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Tool, http_get, string_arg};
use crate::agent::RunError;
use crate::ctx::SessionContext;

pub const DEFAULT_SEARCH_URL: &str = "https://api.duckduckgo.com/";

const MAX_TOPICS: usize = 5;

/// Web search over the DuckDuckGo Instant Answer API (or anything speaking
/// the same JSON).
pub struct WebSearch {
    endpoint: String,
    timeout: Duration,
}

impl WebSearch {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_URL)
    }
}

impl Tool for WebSearch {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for up-to-date information about places, restaurants and flights."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for."
                }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    fn call(&self, args: &serde_json::Value, _ctx: &mut SessionContext) -> Result<String, RunError> {
        let query = string_arg(args, "query")?;
        debug!(query, endpoint = %self.endpoint, "web search");
        let body = http_get(
            &self.endpoint,
            &[("q", query), ("format", "json"), ("no_html", "1")],
            self.timeout,
        )?;
        summarize(&body)
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct RelatedTopic {
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
}

/// Turn an Instant Answer payload into a few lines of plain text.
fn summarize(body: &str) -> Result<String, RunError> {
    let answer: InstantAnswer = serde_json::from_str(body)?;
    let mut lines = Vec::new();

    if !answer.abstract_text.is_empty() {
        let heading = if answer.heading.is_empty() {
            String::new()
        } else {
            format!("{}: ", answer.heading)
        };
        lines.push(format!("{heading}{} ({})", answer.abstract_text, answer.abstract_url));
    }

    for topic in answer.related_topics.iter().take(MAX_TOPICS) {
        if let Some(text) = topic.text.as_deref().filter(|t| !t.is_empty()) {
            match topic.first_url.as_deref() {
                Some(url) => lines.push(format!("- {text} ({url})")),
                None => lines.push(format!("- {text}")),
            }
        }
    }

    if lines.is_empty() {
        return Ok("No results found.".to_string());
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_abstract_and_topics() {
        let body = r#"{
            "Heading": "Tokyo",
            "AbstractText": "Tokyo is the capital of Japan.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Tokyo",
            "RelatedTopics": [
                {"Text": "Shinjuku - a ward", "FirstURL": "https://duckduckgo.com/Shinjuku"},
                {"Name": "Category group without text", "Topics": []}
            ]
        }"#;
        let out = summarize(body).unwrap();
        assert!(out.starts_with("Tokyo: Tokyo is the capital of Japan."));
        assert!(out.contains("- Shinjuku - a ward (https://duckduckgo.com/Shinjuku)"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn empty_payload_reports_no_results() {
        assert_eq!(summarize("{}").unwrap(), "No results found.");
    }

    #[test]
    fn non_json_payload_is_invalid() {
        assert!(matches!(summarize("<html>"), Err(RunError::Invalid(_))));
    }

    #[test]
    fn caps_related_topics() {
        let topics: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"Text": "topic {i}"}}"#))
            .collect();
        let body = format!(r#"{{"RelatedTopics": [{}]}}"#, topics.join(","));
        assert_eq!(summarize(&body).unwrap().lines().count(), MAX_TOPICS);
    }

    #[test]
    fn unreachable_endpoint_is_an_error() {
        let search = WebSearch::new("http://localhost:1/").with_timeout(Duration::from_secs(2));
        let mut ctx = SessionContext::new();
        let result = search.call(&json!({"query": "flights to Rome"}), &mut ctx);
        assert!(result.is_err());
    }
}
