//! Step payload templates
//!
//! String values in a step template may reference earlier data:
//!
//! - `{{input.<path>}}` the workflow's initial payload
//! - `{{steps.<index>.<path>}}` the result of an earlier completed step
//! - `{{<agent>.<path>}}` the latest result produced by that agent
//!
//! The path after the root is optional. A string that is exactly one
//! placeholder becomes the referenced value with its JSON type intact;
//! placeholders embedded in longer text are interpolated as text.

use crate::JsonMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is valid"));

static WHOLE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\{\{\s*([A-Za-z0-9_.]+)\s*\}\}\s*$").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot resolve placeholder '{{{{{placeholder}}}}}': {reason}")]
pub struct TemplateError {
    pub placeholder: String,
    pub reason: String,
}

/// Data a template can reference
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub input: &'a JsonMap,
    /// Results of completed steps, by step index
    pub steps: &'a [JsonMap],
    /// Latest result per agent name
    pub outputs: &'a JsonMap,
}

impl<'a> TemplateContext<'a> {
    /// Context with only the initial payload, for parallel groups
    pub fn input_only(input: &'a JsonMap) -> Self {
        Self {
            input,
            steps: &[],
            outputs: empty_map(),
        }
    }

    fn lookup(&self, reference: &str) -> Result<Value, TemplateError> {
        let fail = |reason: String| TemplateError {
            placeholder: reference.to_string(),
            reason,
        };

        let mut segments = reference.split('.');
        let root = segments.next().unwrap_or_default();

        let base = match root {
            "input" => Value::Object(self.input.clone()),
            "steps" => {
                let index = segments
                    .next()
                    .ok_or_else(|| fail("missing step index".to_string()))?;
                let index: usize = index
                    .parse()
                    .map_err(|_| fail(format!("'{index}' is not a step index")))?;
                let step = self
                    .steps
                    .get(index)
                    .ok_or_else(|| fail(format!("step {index} has no result")))?;
                Value::Object(step.clone())
            }
            agent => self
                .outputs
                .get(agent)
                .cloned()
                .ok_or_else(|| fail(format!("no output from '{agent}'")))?,
        };

        segments.try_fold(base, |current, segment| {
            walk(&current, segment)
                .cloned()
                .ok_or_else(|| fail(format!("no field '{segment}'")))
        })
    }
}

fn empty_map() -> &'static JsonMap {
    static EMPTY: Lazy<JsonMap> = Lazy::new(JsonMap::new);
    &EMPTY
}

fn walk<'v>(value: &'v Value, segment: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Render every placeholder in a template
pub fn render(template: &JsonMap, context: &TemplateContext<'_>) -> Result<JsonMap, TemplateError> {
    template
        .iter()
        .map(|(key, value)| Ok((key.clone(), render_value(value, context)?)))
        .collect()
}

fn render_value(value: &Value, context: &TemplateContext<'_>) -> Result<Value, TemplateError> {
    match value {
        Value::String(text) => render_string(text, context),
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => render(map, context).map(Value::Object),
        other => Ok(other.clone()),
    }
}

fn render_string(text: &str, context: &TemplateContext<'_>) -> Result<Value, TemplateError> {
    if let Some(caps) = WHOLE_PLACEHOLDER.captures(text) {
        return context.lookup(&caps[1]);
    }

    if !PLACEHOLDER.is_match(text) {
        return Ok(Value::String(text.to_string()));
    }

    let mut rendered = String::with_capacity(text.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        rendered.push_str(&text[last..whole.start]);
        match context.lookup(&caps[1])? {
            Value::String(s) => rendered.push_str(&s),
            other => rendered.push_str(&other.to_string()),
        }
        last = whole.end;
    }
    rendered.push_str(&text[last..]);

    Ok(Value::String(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_whole_placeholder_keeps_type() {
        let input = map(json!({"product_name": "텀블러"}));
        let steps = vec![map(json!({"positioning": "친환경", "channels": ["instagram"]}))];
        let outputs = map(json!({"strategist": steps[0].clone()}));
        let context = TemplateContext {
            input: &input,
            steps: &steps,
            outputs: &outputs,
        };

        let rendered = render(
            &map(json!({
                "strategy": "{{strategist}}",
                "first_channel": "{{ steps.0.channels.0 }}",
                "name": "{{input.product_name}}",
            })),
            &context,
        )
        .unwrap();

        assert_eq!(rendered["strategy"], json!({"positioning": "친환경", "channels": ["instagram"]}));
        assert_eq!(rendered["first_channel"], "instagram");
        assert_eq!(rendered["name"], "텀블러");
    }

    #[test]
    fn test_embedded_placeholders_interpolate_text() {
        let input = map(json!({"product_name": "텀블러", "price": 15000}));
        let context = TemplateContext::input_only(&input);

        let rendered = render(
            &map(json!({"hint": "{{input.product_name}} 핵심 메시지, {{input.price}}원"})),
            &context,
        )
        .unwrap();

        assert_eq!(rendered["hint"], "텀블러 핵심 메시지, 15000원");
    }

    #[test]
    fn test_nested_values_are_rendered() {
        let input = map(json!({"tone": "밝은"}));
        let context = TemplateContext::input_only(&input);

        let rendered = render(
            &map(json!({"style": {"tone": "{{input.tone}}"}, "list": ["{{input.tone}}", 3]})),
            &context,
        )
        .unwrap();

        assert_eq!(rendered["style"]["tone"], "밝은");
        assert_eq!(rendered["list"], json!(["밝은", 3]));
    }

    #[test]
    fn test_static_values_pass_through() {
        let input = JsonMap::new();
        let template = map(json!({"channel": "kakao", "count": 2, "braces": "{ not a placeholder }"}));
        let rendered = render(&template, &TemplateContext::input_only(&input)).unwrap();
        assert_eq!(rendered, template);
    }

    #[test]
    fn test_unresolved_placeholders_fail() {
        let input = map(json!({"product_name": "텀블러"}));
        let context = TemplateContext::input_only(&input);

        let err = render(&map(json!({"x": "{{copywriter}}"})), &context).unwrap_err();
        assert_eq!(err.placeholder, "copywriter");
        assert!(err.to_string().contains("{{copywriter}}"));

        let err = render(&map(json!({"x": "{{steps.2}}"})), &context).unwrap_err();
        assert!(err.reason.contains("step 2"));

        let err = render(&map(json!({"x": "{{input.missing}}"})), &context).unwrap_err();
        assert!(err.reason.contains("missing"));
    }
}
