//! Model output normalization
//!
//! JSON-mode replies are not always bare JSON: models wrap them in markdown
//! fences or add a sentence before the object. Extraction tries, in order, the
//! raw text, the first fenced block, then the first balanced `{...}` that
//! parses.

use serde_json::Value;

/// Pull one JSON value out of a model reply
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(block) = extract_fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(&block) {
            return Some(value);
        }
    }

    find_json_object(trimmed).and_then(|s| serde_json::from_str(&s).ok())
}

/// Extract the body of the first markdown code fence
fn extract_fenced_block(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let content = &text[start + 7..];
        if let Some(end) = content.find("```") {
            return Some(content[..end].trim().to_string());
        }
    }

    let start = text.find("```")?;
    let content = &text[start + 3..];
    let end = content.find("```")?;
    let candidate = content[..end].trim();
    (candidate.starts_with('{') && candidate.ends_with('}')).then(|| candidate.to_string())
}

/// Find the first balanced object that parses as JSON
fn find_json_object(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;

    for (i, ch) in text.char_indices() {
        match ch {
            '{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        let candidate = &text[s..=i];
                        if serde_json::from_str::<Value>(candidate).is_ok() {
                            return Some(candidate.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_json() {
        assert_eq!(
            extract_json(r#"{"headline": "여름 세일"}"#),
            Some(json!({"headline": "여름 세일"}))
        );
    }

    #[test]
    fn test_markdown_fence() {
        let text = "Here you go:\n```json\n{\"score\": 8}\n```\nThanks";
        assert_eq!(extract_json(text), Some(json!({"score": 8})));
    }

    #[test]
    fn test_unlabelled_fence() {
        let text = "```\n{\"score\": 9}\n```";
        assert_eq!(extract_json(text), Some(json!({"score": 9})));
    }

    #[test]
    fn test_embedded_object() {
        let text = "Result: {\"a\": {\"b\": 1}} done";
        assert_eq!(extract_json(text), Some(json!({"a": {"b": 1}})));
    }

    #[test]
    fn test_stray_closing_brace_is_ignored() {
        let text = "} oops {\"ok\": true}";
        assert_eq!(extract_json(text), Some(json!({"ok": true})));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(extract_json("just words"), None);
        assert_eq!(extract_json("{not json}"), None);
    }
}
