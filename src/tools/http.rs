use std::time::Duration;

use ureq::Agent;

use crate::agent::RunError;

/// Send a GET request with query parameters and return the response body.
pub fn http_get(url: &str, query: &[(&str, &str)], timeout: Duration) -> Result<String, RunError> {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();

    let agent: Agent = config.into();

    let mut request = agent.get(url).header("Accept", "application/json");
    for (key, value) in query {
        request = request.query(*key, *value);
    }

    let body: String = request.call()?.body_mut().read_to_string()?;

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_get_bad_url_returns_error() {
        let result = http_get("http://localhost:1/nope", &[("q", "paris")], Duration::from_secs(2));
        assert!(matches!(result, Err(RunError::Transient(_))));
    }
}
