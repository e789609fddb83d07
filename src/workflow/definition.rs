//! Static workflow definitions
//!
//! Workflows are fixed at process start. The built-in set lives in
//! [`WorkflowRegistry::builtin`]; nothing edits a registry after construction.

use crate::agent::catalog::AgentName;
use crate::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// One step at a time, fail-fast
    Sequential,
    /// All steps at once behind a join barrier
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub agent: AgentName,
    pub task: String,
    /// Static values and `{{...}}` placeholders
    #[serde(default)]
    pub payload_template: JsonMap,
    /// Passed through as request options
    #[serde(default)]
    pub options: JsonMap,
}

impl WorkflowStep {
    pub fn new<T: Into<String>>(agent: AgentName, task: T) -> Self {
        Self {
            agent,
            task: task.into(),
            payload_template: JsonMap::new(),
            options: JsonMap::new(),
        }
    }

    pub fn with_template(mut self, template: Value) -> Self {
        if let Value::Object(map) = template {
            self.payload_template = map;
        }
        self
    }

    pub fn with_option<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    pub description: String,
    pub step_type: StepType,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        description: D,
        step_type: StepType,
        steps: Vec<WorkflowStep>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            step_type,
            steps,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }
}

/// Immutable name → definition lookup
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, WorkflowDefinition>,
}

impl WorkflowRegistry {
    pub fn new(definitions: Vec<WorkflowDefinition>) -> Self {
        Self {
            workflows: definitions
                .into_iter()
                .map(|definition| (definition.name.clone(), definition))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_workflows())
    }

    pub fn get(&self, name: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &WorkflowDefinition> {
        self.workflows.values()
    }
}

const REVIEW_CRITERIA: [&str; 4] = ["브랜드 톤 일치", "문법 및 맞춤법", "메시지 명확성", "법적 리스크"];

fn builtin_workflows() -> Vec<WorkflowDefinition> {
    vec![
        WorkflowDefinition::new(
            "product_content",
            "Product strategy, copy and review",
            StepType::Sequential,
            vec![
                WorkflowStep::new(AgentName::Strategist, "product_strategy"),
                WorkflowStep::new(AgentName::Copywriter, "product_copy").with_template(json!({
                    "strategy": "{{strategist}}",
                    "headline_hint": "{{input.product_name}} 핵심 메시지",
                })),
                WorkflowStep::new(AgentName::Reviewer, "content_review").with_template(json!({
                    "content": "{{copywriter}}",
                    "criteria": REVIEW_CRITERIA,
                })),
            ],
        ),
        WorkflowDefinition::new(
            "brand_identity",
            "Brand analysis, brand strategy and brand copy",
            StepType::Sequential,
            vec![
                WorkflowStep::new(AgentName::BrandAnalyzer, "brand_analysis"),
                WorkflowStep::new(AgentName::Strategist, "brand_strategy").with_template(json!({
                    "brand_analysis": "{{brand_analyzer}}",
                })),
                WorkflowStep::new(AgentName::Copywriter, "brand_copy").with_template(json!({
                    "strategy": "{{strategist}}",
                    "brand_analysis": "{{steps.0}}",
                })),
            ],
        ),
        WorkflowDefinition::new(
            "video_storyboard",
            "Video concept, scene storyboard and review",
            StepType::Sequential,
            vec![
                WorkflowStep::new(AgentName::Strategist, "video_concept"),
                WorkflowStep::new(AgentName::ScenePlanner, "storyboard").with_template(json!({
                    "concept": "{{strategist}}",
                })),
                WorkflowStep::new(AgentName::Reviewer, "content_review").with_template(json!({
                    "content": "{{scene_planner}}",
                    "criteria": ["장면 흐름", "제품 노출", "길이 적합성"],
                })),
            ],
        ),
        WorkflowDefinition::new(
            "content_review",
            "Review, optimize and edit the same content concurrently",
            StepType::Parallel,
            vec![
                WorkflowStep::new(AgentName::Reviewer, "content_review").with_template(json!({
                    "criteria": REVIEW_CRITERIA,
                })),
                WorkflowStep::new(AgentName::Optimizer, "content_optimization").with_template(
                    json!({
                        "goals": ["클릭률 향상"],
                    }),
                ),
                WorkflowStep::new(AgentName::Editor, "content_edit").with_template(json!({
                    "instructions": "맞춤법을 교정하고 문장을 간결하게 다듬어 주세요",
                })),
            ],
        ),
        WorkflowDefinition::new(
            "multichannel_copy",
            "Channel-specific copy for three channels concurrently",
            StepType::Parallel,
            ["instagram", "naver_blog", "kakao"]
                .into_iter()
                .map(|channel| {
                    WorkflowStep::new(AgentName::Copywriter, "channel_copy")
                        .with_template(json!({ "channel": channel }))
                })
                .collect(),
        ),
    ]
}
