//! Context minimization
//!
//! Cuts the caller's context down to the fields the target agent declares, so
//! downstream prompts carry fewer tokens. This is a cost measure only; it is
//! not an access-control boundary.

use crate::agent::catalog::AgentName;
use crate::JsonMap;
use serde_json::{json, Value};

/// Key holding the condensed brand kit for non-brand agents
pub const BRANDKIT_SUMMARY_KEY: &str = "brandkit_summary";

const BRANDKIT_KEY: &str = "brandkit";

#[derive(Debug, Clone, Copy, Default)]
pub struct ContextMinimizer;

impl ContextMinimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn minimize(&self, agent: AgentName, context: &JsonMap) -> JsonMap {
        if agent == AgentName::FULL_CONTEXT {
            return context.clone();
        }

        let mut minimized: JsonMap = agent
            .required_fields()
            .iter()
            .filter_map(|field| {
                context
                    .get(*field)
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect();

        if agent != AgentName::BRAND_SPECIFIC {
            if let Some(brandkit) = context.get(BRANDKIT_KEY) {
                minimized.remove(BRANDKIT_KEY);
                minimized.insert(BRANDKIT_SUMMARY_KEY.to_string(), summarize_brandkit(brandkit));
            }
        }

        minimized
    }
}

/// Condense a brand kit to primary color, primary font and tone
pub fn summarize_brandkit(brandkit: &Value) -> Value {
    json!({
        "primaryColor": brandkit.pointer("/colors/primary").cloned().unwrap_or(Value::Null),
        "font": brandkit.pointer("/typography/primaryFont").cloned().unwrap_or(Value::Null),
        "tone": brandkit.get("tone").cloned().unwrap_or(Value::Null),
    })
}

/// Byte length of the context serialized as JSON
pub fn serialized_size(context: &JsonMap) -> usize {
    serde_json::to_vec(context).map(|bytes| bytes.len()).unwrap_or(0)
}
