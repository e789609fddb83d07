//! Typed task payloads
//!
//! Envelopes carry payloads as opaque JSON maps. Worker logic parses them into
//! a [`TaskPayload`] keyed by (agent, task) so schema mistakes surface as a
//! validation failure before any model is called. Pairs without a dedicated
//! schema pass through as [`TaskPayload::Opaque`]. Unknown fields are ignored
//! so workflow accumulators can ride along.

use crate::agent::catalog::AgentName;
use crate::error::AgentError;
use crate::JsonMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{agent}/{task}: {message}")]
pub struct PayloadError {
    pub agent: AgentName,
    pub task: String,
    pub message: String,
}

impl From<PayloadError> for AgentError {
    fn from(err: PayloadError) -> Self {
        AgentError::invalid_payload(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInput {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub target_audience: Option<Value>,
    #[serde(default)]
    pub goals: Option<Value>,
    #[serde(default)]
    pub budget: Option<Value>,
    #[serde(default)]
    pub brand_analysis: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyInput {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub features: Option<Value>,
    #[serde(default)]
    pub strategy: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub content: Value,
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeInput {
    pub content: Value,
    #[serde(default)]
    pub metrics: Option<Value>,
    #[serde(default)]
    pub goals: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditInput {
    pub content: Value,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAnalysisInput {
    pub brand_name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub brandkit: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardInput {
    pub product_name: String,
    #[serde(default)]
    pub concept: Option<Value>,
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub style: Option<String>,
}

/// Payload validated against the schema of its (agent, task) pair
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    Strategy(StrategyInput),
    Copy(CopyInput),
    Review(ReviewInput),
    Optimize(OptimizeInput),
    Edit(EditInput),
    BrandAnalysis(BrandAnalysisInput),
    Storyboard(StoryboardInput),
    Opaque(JsonMap),
}

impl TaskPayload {
    pub fn parse(agent: AgentName, task: &str, payload: &JsonMap) -> Result<Self, PayloadError> {
        let fail = |message: String| PayloadError {
            agent,
            task: task.to_string(),
            message,
        };

        let parsed = match (agent, task) {
            (AgentName::Strategist, "product_strategy" | "brand_strategy" | "video_concept") => {
                let input: StrategyInput = decode(payload).map_err(fail)?;
                let missing = match task {
                    "brand_strategy" => is_blank(&input.brand_name).then_some("brand_name"),
                    _ => is_blank(&input.product_name).then_some("product_name"),
                };
                if let Some(field) = missing {
                    return Err(fail(format!("missing field `{field}`")));
                }
                TaskPayload::Strategy(input)
            }
            (AgentName::Copywriter, "product_copy" | "brand_copy" | "channel_copy") => {
                let input: CopyInput = decode(payload).map_err(fail)?;
                if is_blank(&input.product_name) && is_blank(&input.brand_name) {
                    return Err(fail(
                        "one of `product_name` or `brand_name` is required".to_string(),
                    ));
                }
                if task == "channel_copy" && is_blank(&input.channel) {
                    return Err(fail("missing field `channel`".to_string()));
                }
                TaskPayload::Copy(input)
            }
            (AgentName::Reviewer, "content_review") => {
                let input: ReviewInput = decode(payload).map_err(fail)?;
                if input.content.is_null() {
                    return Err(fail("`content` must not be null".to_string()));
                }
                TaskPayload::Review(input)
            }
            (AgentName::Optimizer, "content_optimization") => {
                let input: OptimizeInput = decode(payload).map_err(fail)?;
                if input.content.is_null() {
                    return Err(fail("`content` must not be null".to_string()));
                }
                TaskPayload::Optimize(input)
            }
            (AgentName::Editor, "content_edit") => {
                let input: EditInput = decode(payload).map_err(fail)?;
                if input.content.is_null() {
                    return Err(fail("`content` must not be null".to_string()));
                }
                TaskPayload::Edit(input)
            }
            (AgentName::BrandAnalyzer, "brand_analysis") => {
                let input: BrandAnalysisInput = decode(payload).map_err(fail)?;
                if input.brand_name.trim().is_empty() {
                    return Err(fail("`brand_name` must not be empty".to_string()));
                }
                TaskPayload::BrandAnalysis(input)
            }
            (AgentName::ScenePlanner, "storyboard") => {
                let input: StoryboardInput = decode(payload).map_err(fail)?;
                if input.product_name.trim().is_empty() {
                    return Err(fail("`product_name` must not be empty".to_string()));
                }
                TaskPayload::Storyboard(input)
            }
            _ => TaskPayload::Opaque(payload.clone()),
        };

        Ok(parsed)
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, TaskPayload::Opaque(_))
    }
}

fn decode<T: DeserializeOwned>(payload: &JsonMap) -> Result<T, String> {
    serde_json::from_value(Value::Object(payload.clone())).map_err(|e| e.to_string())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}
