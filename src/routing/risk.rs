//! Risk assessment heuristics
//!
//! Rules are evaluated in fixed precedence and the first one that fires
//! decides the tier:
//!
//! 1. high-risk keyword in the text → high
//! 2. large-quantity marker in the text → high
//! 3. `context.budget` above the configured threshold → high
//! 4. intent is strategy or complex workflow → medium
//! 5. otherwise → low

use super::intent::Intent;
use crate::config::RouterSection;
use crate::JsonMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::num::IntErrorKind;

/// Coarse cost/impact tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Launch, full-campaign and bulk-run language
pub static HIGH_RISK_KEYWORDS: &[&str] = &[
    "전체 캠페인",
    "캠페인 전체",
    "런칭",
    "론칭",
    "신제품 출시",
    "일괄",
    "전사",
];

/// Words that signal a large batch without a number
pub static LARGE_QUANTITY_WORDS: &[&str] = &["대량", "수백", "수천"];

static COUNTED_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9][0-9,]*)\s*(개|건|장|편|종)").expect("quantity pattern is valid")
});

/// Which rule decided the tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRule {
    HighRiskKeyword,
    LargeQuantity,
    BudgetThreshold,
    ComplexIntent,
    Default,
}

/// Tier plus the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub rule: RiskRule,
}

/// Ordered risk heuristics
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    budget_threshold: f64,
    large_quantity_threshold: u64,
}

impl Default for RiskAssessor {
    fn default() -> Self {
        Self::new(&RouterSection::default())
    }
}

impl RiskAssessor {
    pub fn new(config: &RouterSection) -> Self {
        Self {
            budget_threshold: config.budget_threshold,
            large_quantity_threshold: config.large_quantity_threshold,
        }
    }

    pub fn assess(&self, text: &str, context: &JsonMap, intent: Intent) -> RiskAssessment {
        let (level, rule) = if contains_high_risk_keyword(text) {
            (RiskLevel::High, RiskRule::HighRiskKeyword)
        } else if self.has_large_quantity(text) {
            (RiskLevel::High, RiskRule::LargeQuantity)
        } else if self.budget_exceeds_threshold(context) {
            (RiskLevel::High, RiskRule::BudgetThreshold)
        } else if matches!(intent, Intent::Strategy | Intent::ComplexWorkflow) {
            (RiskLevel::Medium, RiskRule::ComplexIntent)
        } else {
            (RiskLevel::Low, RiskRule::Default)
        };

        RiskAssessment { level, rule }
    }

    fn has_large_quantity(&self, text: &str) -> bool {
        if LARGE_QUANTITY_WORDS.iter().any(|w| text.contains(w)) {
            return true;
        }

        let text = ascii_digits(text);
        COUNTED_QUANTITY.captures_iter(&text).any(|caps| {
            match caps[1].replace(',', "").parse::<u64>() {
                Ok(n) => n >= self.large_quantity_threshold,
                // Digit runs too long for u64 are large by definition
                Err(e) => matches!(e.kind(), IntErrorKind::PosOverflow),
            }
        })
    }

    fn budget_exceeds_threshold(&self, context: &JsonMap) -> bool {
        parse_budget(context.get("budget"))
            .map(|budget| budget > self.budget_threshold)
            .unwrap_or(false)
    }
}

/// Fold full-width digits (U+FF10..U+FF19) onto ASCII
fn ascii_digits(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ('０'..='９').contains(&c)) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match c {
                '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
                other => other,
            })
            .collect(),
    )
}

fn contains_high_risk_keyword(text: &str) -> bool {
    HIGH_RISK_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Accept numeric budgets and numeric strings with thousands separators
fn parse_budget(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    fn assess(text: &str, ctx: Value, intent: Intent) -> RiskAssessment {
        RiskAssessor::default().assess(text, &context(ctx), intent)
    }

    #[test]
    fn test_high_risk_keyword() {
        let result = assess("신규 라인 런칭 카피", json!({}), Intent::Copywriting);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.rule, RiskRule::HighRiskKeyword);
    }

    #[test]
    fn test_counted_quantity_at_threshold_is_high() {
        let result = assess("배너 10장 만들어줘", json!({}), Intent::Design);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.rule, RiskRule::LargeQuantity);
    }

    #[test]
    fn test_counted_quantity_with_separator() {
        let result = assess("상품 설명 1,200개", json!({}), Intent::Copywriting);
        assert_eq!(result.rule, RiskRule::LargeQuantity);
    }

    #[test]
    fn test_small_quantity_is_not_high() {
        let result = assess("배너 3장 만들어줘", json!({}), Intent::Design);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_full_width_small_quantity_is_not_high() {
        let result = assess("배너 ３장 디자인", json!({}), Intent::Design);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_full_width_large_quantity_is_high() {
        let result = assess("배너 ５００장 디자인", json!({}), Intent::Design);
        assert_eq!(result.rule, RiskRule::LargeQuantity);
    }

    #[test]
    fn test_overflowing_quantity_is_high() {
        let result = assess("배너 99999999999999999999999장", json!({}), Intent::Design);
        assert_eq!(result.rule, RiskRule::LargeQuantity);
    }

    #[test]
    fn test_quantity_word_is_high() {
        let result = assess("대량 상품 문구", json!({}), Intent::Copywriting);
        assert_eq!(result.rule, RiskRule::LargeQuantity);
    }

    #[test]
    fn test_budget_over_threshold() {
        let result = assess("카피 작성", json!({"budget": 5_000_000}), Intent::Copywriting);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.rule, RiskRule::BudgetThreshold);

        let result = assess("카피 작성", json!({"budget": "2,000,000"}), Intent::Copywriting);
        assert_eq!(result.rule, RiskRule::BudgetThreshold);
    }

    #[test]
    fn test_budget_at_threshold_is_not_high() {
        let result = assess("카피 작성", json!({"budget": 1_000_000}), Intent::Copywriting);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_non_numeric_budget_ignored() {
        let result = assess("카피 작성", json!({"budget": "lots"}), Intent::Copywriting);
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn test_strategy_and_complex_intents_are_medium() {
        assert_eq!(
            assess("전략 세워줘", json!({}), Intent::Strategy).level,
            RiskLevel::Medium
        );
        assert_eq!(
            assess("통합 제작", json!({}), Intent::ComplexWorkflow).level,
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_keyword_takes_precedence_over_intent() {
        let result = assess("전체 캠페인 전략", json!({}), Intent::Strategy);
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.rule, RiskRule::HighRiskKeyword);
    }

    #[test]
    fn test_default_is_low() {
        let result = assess("카피 작성해줘", json!({}), Intent::Copywriting);
        assert_eq!(result.level, RiskLevel::Low);
        assert_eq!(result.rule, RiskRule::Default);
    }
}
