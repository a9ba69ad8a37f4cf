use serde_json::Value;

/// Remove a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    // Skip first line (```json) and the closing fence when present
    let end = if lines.len() > 1 && lines[lines.len() - 1].trim_start().starts_with("```") {
        lines.len() - 1
    } else {
        lines.len()
    };
    lines[1.min(end)..end].join("\n")
}

/// Find the JSON object in a model response.
///
/// Tries the whole (fence-stripped) text first, then the outermost `{ ... }`
/// span, since some models wrap structured output in prose.
pub fn extract_json(response: &str) -> Option<Value> {
    let text = strip_code_fences(response);
    if let Ok(value) = serde_json::from_str::<Value>(&text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
