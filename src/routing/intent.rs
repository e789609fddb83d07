//! Keyword intent classification
//!
//! An ordered rule table maps request text to a coarse intent. The first rule
//! with any keyword contained in the text wins, so rule order is also the
//! tie-break between categories. The keyword sets are Korean; text in any other
//! language classifies as [`Intent::Unknown`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence reported for a keyword hit
pub const MATCH_CONFIDENCE: f64 = 0.8;

/// Confidence reported when no rule matches
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Coarse category of what a request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Copywriting,
    Strategy,
    Design,
    Review,
    Optimization,
    Editing,
    Video,
    BrandAnalysis,
    ComplexWorkflow,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Copywriting => "copywriting",
            Intent::Strategy => "strategy",
            Intent::Design => "design",
            Intent::Review => "review",
            Intent::Optimization => "optimization",
            Intent::Editing => "editing",
            Intent::Video => "video",
            Intent::BrandAnalysis => "brand_analysis",
            Intent::ComplexWorkflow => "complex_workflow",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered (intent, keywords) rules. Order is significant.
pub static INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Copywriting,
        &["카피", "문구", "헤드라인", "슬로건", "광고 문안", "캐치프레이즈", "상세페이지"],
    ),
    (
        Intent::Strategy,
        &["전략", "기획", "캠페인", "타겟", "포지셔닝", "마케팅 계획"],
    ),
    (
        Intent::Design,
        &["디자인", "이미지", "배너", "로고", "포스터", "썸네일"],
    ),
    (Intent::Review, &["검토", "리뷰", "피드백", "평가", "검수"]),
    (Intent::Optimization, &["최적화", "개선", "성과", "전환율"]),
    (Intent::Editing, &["편집", "수정", "교정", "다듬어", "윤문"]),
    (Intent::Video, &["영상", "비디오", "쇼츠", "스토리보드", "릴스"]),
    (
        Intent::BrandAnalysis,
        &["브랜드 분석", "브랜드킷", "브랜드 가이드", "브랜드 아이덴티티"],
    ),
    (
        Intent::ComplexWorkflow,
        &["전체 패키지", "풀 패키지", "통합", "한 번에", "일괄 제작"],
    ),
];

/// Result of classifying one request
#[derive(Debug, Clone, PartialEq)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub reasoning: String,
}

/// Ordered keyword matcher over [`INTENT_RULES`]
#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    rules: &'static [(Intent, &'static [&'static str])],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            rules: INTENT_RULES,
        }
    }

    pub fn classify(&self, text: &str) -> IntentClassification {
        let normalized = text.to_lowercase();

        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
            .map(|(intent, _)| IntentClassification {
                intent: *intent,
                confidence: MATCH_CONFIDENCE,
                reasoning: "keyword match".to_string(),
            })
            .unwrap_or_else(|| IntentClassification {
                intent: Intent::Unknown,
                confidence: FALLBACK_CONFIDENCE,
                reasoning: "no keyword match".to_string(),
            })
    }
}
