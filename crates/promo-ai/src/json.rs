//! Lenient JSON extraction from model output.
//!
//! Chat models frequently wrap JSON in prose or markdown fences. Parsing
//! is attempted in order: the whole text, the first fenced code block,
//! the first `{…}` object, the first `[…]` array.

use serde_json::Value;

/// Extract the first parseable JSON value from model output text.
pub fn extract_json(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    if let Some(block) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(block.trim()) {
            return Some(value);
        }
    }

    if let Some(candidate) = delimited_span(text, '{', '}') {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Some(value);
        }
    }

    if let Some(candidate) = delimited_span(text, '[', ']') {
        if let Ok(value) = serde_json::from_str(candidate) {
            return Some(value);
        }
    }

    None
}

/// Contents of the first ``` fenced block, tolerating a `json` language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let end = rest.find("```")?;
    Some(&rest[..end])
}

/// Widest span between the first opening and last closing delimiter.
fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let value = extract_json(r#"{"hook": "hi"}"#).unwrap();
        assert_eq!(value["hook"], "hi");
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here is the script:\n```json\n{\"hook\": \"hi\"}\n```\nEnjoy!";
        let value = extract_json(text).unwrap();
        assert_eq!(value["hook"], "hi");
    }

    #[test]
    fn test_fenced_block_without_tag() {
        let text = "```\n{\"cta\": \"buy\"}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["cta"], "buy");
    }

    #[test]
    fn test_embedded_object() {
        let text = "Sure! {\"scenes\": []} hope that helps";
        let value = extract_json(text).unwrap();
        assert!(value["scenes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_embedded_array() {
        let value = extract_json("points: [1, 2, 3]").unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(extract_json("").is_none());
        assert!(extract_json("no json here").is_none());
        assert!(extract_json("{broken").is_none());
    }
}
