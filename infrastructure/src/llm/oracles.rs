//! LLM-backed similarity and scoring oracles.
//!
//! Both ask a fast utility model for a single number and refuse to guess
//! when the reply is not numeric: an unparsable reply becomes
//! [`OracleError::Unparsable`] and the consuming engine falls back to its
//! own heuristic.

use super::chat::ChatClient;
use async_trait::async_trait;
use gatherline_application::ports::oracle::{OracleError, ScoringOracle, SimilarityOracle};
use gatherline_domain::{DepartmentConfig, GatherItem, QualityRubric, preview};
use std::fmt::Write as _;

const SCORE_MAX_TOKENS: u32 = 10;

/// Similarity oracle asking a utility model to rate two texts.
pub struct LlmSimilarityOracle {
    chat: ChatClient,
    model: String,
}

impl LlmSimilarityOracle {
    pub fn new(chat: ChatClient, model: impl Into<String>) -> Self {
        Self {
            chat,
            model: model.into(),
        }
    }
}

#[async_trait]
impl SimilarityOracle for LlmSimilarityOracle {
    async fn score(&self, a: &str, b: &str) -> Result<f32, OracleError> {
        let prompt = format!(
            "Rate the semantic similarity between these two texts on a scale \
             of 0.0 to 1.0:\n\n\
             Text 1: {a}\n\nText 2: {b}\n\n\
             Consider whether they discuss the same topic, convey the same \
             information, and would be redundant if both were included.\n\
             Return ONLY the numeric score (e.g., 0.85). No explanation."
        );

        let reply = self
            .chat
            .complete(&self.model, &prompt, SCORE_MAX_TOKENS, 0.0)
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        parse_score(&reply).map(|score| score.clamp(0.0, 1.0))
    }
}

/// Scoring oracle asking a utility model to grade a department corpus.
pub struct LlmScoringOracle {
    chat: ChatClient,
    model: String,
}

impl LlmScoringOracle {
    pub fn new(chat: ChatClient, model: impl Into<String>) -> Self {
        Self {
            chat,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ScoringOracle for LlmScoringOracle {
    async fn score_department(
        &self,
        department: &DepartmentConfig,
        items: &[GatherItem],
        rubric: &QualityRubric,
    ) -> Result<f32, OracleError> {
        let prompt = format!(
            "Analyze the quality and completeness of gather items for the \
             **{name}** department.\n\n\
             **Department**: {name}\n\
             **Description**: {description}\n\
             **Number of Items**: {count}\n\n\
             **Items**:\n{items}\n\
             **Evaluation Criteria**:\n\
             1. **Coverage** ({coverage}%): Do items cover diverse aspects of {name}?\n\
             2. **Depth** ({depth}%): Are items detailed and actionable?\n\
             3. **Relevance** ({relevance}%): Are items specific to {name}'s needs?\n\
             4. **Quality** ({quality}%): Are items well-written and clear?\n\n\
             Rate the overall quality on a scale of 0-100. Return ONLY the \
             numeric score (e.g., 85). No explanation.",
            name = department.name,
            description = department.description,
            count = items.len(),
            items = format_items(items),
            coverage = rubric.coverage,
            depth = rubric.depth,
            relevance = rubric.relevance,
            quality = rubric.quality,
        );

        let reply = self
            .chat
            .complete(&self.model, &prompt, SCORE_MAX_TOKENS, 0.0)
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        parse_score(&reply).map(|score| score.clamp(0.0, 100.0))
    }
}

fn format_items(items: &[GatherItem]) -> String {
    let mut formatted = String::new();
    for (index, item) in items.iter().enumerate() {
        let iteration = item
            .automation_metadata
            .as_ref()
            .map(|m| m.iteration.to_string())
            .unwrap_or_else(|| "manual".to_string());
        let _ = writeln!(
            formatted,
            "{}. **{}** (iteration {})\n   Preview: {}",
            index + 1,
            item.summary,
            iteration,
            preview(&item.content, 200),
        );
    }
    formatted
}

/// Parse a numeric score out of a model reply.
fn parse_score(reply: &str) -> Result<f32, OracleError> {
    reply
        .trim()
        .trim_end_matches(['.', '%'])
        .parse::<f32>()
        .map_err(|_| OracleError::Unparsable(reply.to_string()))
}
