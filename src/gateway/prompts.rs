//! Prompt assembly for generate calls

use super::service::GenerationMode;
use crate::agent::catalog::AgentName;
use crate::JsonMap;
use std::str::FromStr;

const JSON_CONTRACT: &str =
    "Return exactly one JSON object. Do not wrap it in markdown and do not add commentary.";
const TEXT_CONTRACT: &str = "Return plain text only.";

/// System prompt for a (role, task) pair
pub fn system_prompt(role: &str, task: &str, mode: GenerationMode) -> String {
    let persona = match AgentName::from_str(role) {
        Ok(agent) => format!(
            "You are the {} agent of a marketing content team. {}.",
            agent.as_str(),
            agent.profile().description
        ),
        Err(_) => format!("You are the {role} agent of a marketing content team."),
    };

    let contract = match mode {
        GenerationMode::Json => JSON_CONTRACT,
        GenerationMode::Text => TEXT_CONTRACT,
    };

    format!(
        "{persona}\nCurrent task: {task}.\nWrite in the language of the input fields.\n{contract}"
    )
}

/// User prompt carrying the task payload
pub fn user_prompt(task: &str, payload: &JsonMap) -> String {
    let input = serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string());
    format!("Task: {task}\nInput:\n{input}")
}
