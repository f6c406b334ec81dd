//! Recovers a JSON payload from language-model output that may be wrapped in
//! prose or markdown code fences.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api_connection::connection::ApiConnectionError;

/// Body of the first fenced code block, with an optional language tag stripped.
fn fenced_block(content: &str) -> Option<&str> {
    let start = content.find("```")?;
    let after_fence = &content[start + 3..];
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    // A fence immediately followed by JSON on the same line has no language tag.
    let first_line = &after_fence[..body_start];
    let body = if first_line.trim_start().starts_with(['{', '[']) {
        after_fence
    } else {
        &after_fence[body_start..]
    };
    let end = body.find("```").unwrap_or(body.len());
    Some(body[..end].trim())
}

/// The span from the first opening bracket to the last matching closing one.
fn bracketed_span(content: &str) -> Option<&str> {
    let object_start = content.find('{');
    let array_start = content.find('[');
    let (start, close) = match (object_start, array_start) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };
    let end = content.rfind(close)?;
    (end > start).then(|| &content[start..=end])
}

/// Parses `content` as `T`, trying progressively looser extractions:
/// the raw text, the first fenced code block, then the outermost bracketed span.
pub fn extract_json<T: DeserializeOwned>(content: &str) -> Result<T, ApiConnectionError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ApiConnectionError::EmptyResponse);
    }

    let first_error = match serde_json::from_str::<T>(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let Some(block) = fenced_block(trimmed) {
        match serde_json::from_str::<T>(block) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(error = %e, "fenced block was not valid JSON"),
        }
    }

    if let Some(span) = bracketed_span(trimmed) {
        match serde_json::from_str::<T>(span) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(error = %e, "bracketed span was not valid JSON"),
        }
    }

    Err(ApiConnectionError::UnparseableResponse {
        reason: first_error.to_string(),
        content: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Title {
        title: String,
    }

    #[test]
    fn parses_clean_json() {
        let parsed: Title = extract_json(r#"  {"title": "Soup"} "#).unwrap();
        assert_eq!(parsed.title, "Soup");
    }

    #[test]
    fn parses_fenced_json_with_language_tag() {
        let content = "Here you go:\n```json\n{\"title\": \"Stew\"}\n```\nEnjoy!";
        let parsed: Title = extract_json(content).unwrap();
        assert_eq!(parsed.title, "Stew");
    }

    #[test]
    fn parses_fence_without_tag() {
        let content = "```{\"title\": \"Curry\"}```";
        let parsed: Title = extract_json(content).unwrap();
        assert_eq!(parsed.title, "Curry");
    }

    #[test]
    fn falls_back_to_outer_braces() {
        let content = "Sure! The recipe is {\"title\": \"Pie\"} and that's it.";
        let parsed: Title = extract_json(content).unwrap();
        assert_eq!(parsed.title, "Pie");
    }

    #[test]
    fn extracts_arrays_when_they_come_first() {
        let content = "Steps: [\"Chop\", \"Fry {gently}\"] done";
        let parsed: Vec<String> = extract_json(content).unwrap();
        assert_eq!(parsed, vec!["Chop".to_string(), "Fry {gently}".to_string()]);
    }

    #[test]
    fn empty_content_is_an_empty_response() {
        assert!(matches!(extract_json::<Value>("  \n"), Err(ApiConnectionError::EmptyResponse)));
    }

    #[test]
    fn garbage_is_unparseable() {
        let result = extract_json::<Title>("I could not think of a recipe.");
        match result {
            Err(ApiConnectionError::UnparseableResponse { content, .. }) => {
                assert_eq!(content, "I could not think of a recipe.");
            }
            other => panic!("expected UnparseableResponse, got {:?}", other),
        }
    }
}
