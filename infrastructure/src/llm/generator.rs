//! LLM-backed content generator.
//!
//! Builds a department prompt from the cascading summaries of previously
//! completed departments plus a window over the most recent context items,
//! asks for a JSON array of new items, and parses it leniently (models like
//! to wrap JSON in code fences). When the model is unreachable or the reply
//! cannot be parsed, the generator degrades to a small deterministic
//! placeholder batch instead of failing the iteration.

use super::chat::ChatClient;
use async_trait::async_trait;
use gatherline_application::ports::content_generator::{ContentGenerator, GeneratorError};
use gatherline_domain::{
    CandidateItem, ContextItem, DepartmentConfig, DepartmentRunSummary, preview,
};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

/// Only the most recent context items are inlined into the prompt.
const CONTEXT_WINDOW: usize = 20;

const GENERATION_MAX_TOKENS: u32 = 3000;
const GENERATION_TEMPERATURE: f32 = 0.7;

/// Content generator backed by a chat-completions model.
pub struct LlmContentGenerator {
    chat: ChatClient,
}

impl LlmContentGenerator {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(
        &self,
        department: &DepartmentConfig,
        context: &[ContextItem],
        cascade: &[DepartmentRunSummary],
        model: &str,
    ) -> Result<Vec<CandidateItem>, GeneratorError> {
        let prompt = build_prompt(department, context, cascade);
        info!(
            department = %department.slug,
            model,
            prompt_length = prompt.len(),
            "Generating content batch"
        );

        let reply = match self
            .chat
            .complete(model, &prompt, GENERATION_MAX_TOKENS, GENERATION_TEMPERATURE)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    department = %department.slug,
                    error = %e,
                    "Chat endpoint unavailable, using placeholder batch"
                );
                return Ok(placeholder_batch(department, cascade));
            }
        };

        match parse_item_batch(&reply) {
            Ok(items) => {
                debug!(
                    department = %department.slug,
                    count = items.len(),
                    "Parsed generated items"
                );
                Ok(items)
            }
            Err(e) => {
                warn!(
                    department = %department.slug,
                    error = %e,
                    "Unparsable generation reply, using placeholder batch"
                );
                Ok(placeholder_batch(department, cascade))
            }
        }
    }
}

fn build_prompt(
    department: &DepartmentConfig,
    context: &[ContextItem],
    cascade: &[DepartmentRunSummary],
) -> String {
    let role = if department.description.is_empty() {
        format!("Generate content for {}", department.name)
    } else {
        department.description.clone()
    };

    let mut cascade_block = String::new();
    for summary in cascade {
        let _ = writeln!(
            cascade_block,
            "**{}** (Quality: {:.0}%, {} items, {} iterations, model {})",
            summary.name,
            summary.quality_score,
            summary.items_created,
            summary.iterations,
            summary.model,
        );
    }
    if cascade_block.is_empty() {
        cascade_block.push_str("No previous context yet (this is the first department)");
    }

    let window = if context.len() > CONTEXT_WINDOW {
        &context[context.len() - CONTEXT_WINDOW..]
    } else {
        context
    };
    let mut context_block = String::new();
    for (index, item) in window.iter().enumerate() {
        let summary = item.summary.as_deref().unwrap_or("");
        let _ = writeln!(
            context_block,
            "{}. {}: {}",
            index + 1,
            summary,
            preview(&item.content, 200)
        );
    }
    if context_block.is_empty() {
        context_block.push_str("No existing items yet");
    }

    format!(
        "You are generating gather items for the **{name}** department of a \
         production project.\n\n\
         **Your Role**: {role}\n\n\
         **Previous Department Context** (build upon this):\n{cascade_block}\n\n\
         **Existing Items** (most recent {window_size}):\n{context_block}\n\n\
         **Task**: Generate 5-10 NEW items that build on the previous \
         departments, are specific to {name}, are not duplicates of the \
         existing items above, cover different aspects of {name}, and are \
         production-ready. Each item should be 200-500 words of detailed, \
         specific content.\n\n\
         **Output format**: a JSON array of objects with \"content\", \
         \"summary\" (max 100 chars) and \"context\" fields. Return ONLY the \
         JSON array, no explanation or markdown.",
        name = department.name,
        role = role,
        cascade_block = cascade_block,
        window_size = CONTEXT_WINDOW,
        context_block = context_block,
    )
}

/// Deterministic standin batch used when the model cannot be reached or its
/// reply cannot be parsed.
///
/// The items are identical across calls for a department, so after one
/// persisted batch every later placeholder round dies in dedup and the
/// department loop terminates instead of looping on the dead model.
fn placeholder_batch(
    department: &DepartmentConfig,
    cascade: &[DepartmentRunSummary],
) -> Vec<CandidateItem> {
    let carry_over = cascade
        .last()
        .map(|s| format!(" Carries forward themes from {}.", s.name))
        .unwrap_or_default();

    let items: Vec<CandidateItem> = (1..=3)
        .map(|n| {
            CandidateItem::new(
                format!(
                    "Placeholder item {n} for {name}.{carry_over} Outlines one aspect \
                     the {name} team should develop: concrete requirements, reference \
                     material, and the practical steps needed to bring this part of \
                     the project to a production-ready state.",
                    name = department.name,
                ),
                format!("Placeholder item {n} for {}", department.name),
            )
            .with_context(format!(
                "Standin content recorded while no generation model was reachable for {}",
                department.name
            ))
        })
        .collect();

    info!(
        department = %department.slug,
        count = items.len(),
        "Generated placeholder content"
    );
    items
}

/// Parse a generated batch, tolerating code fences and surrounding prose.
fn parse_item_batch(reply: &str) -> Result<Vec<CandidateItem>, GeneratorError> {
    let trimmed = strip_code_fences(reply);

    let array_text = match trimmed.find('[') {
        Some(start) => {
            let end = trimmed
                .rfind(']')
                .ok_or_else(|| GeneratorError::InvalidOutput("unterminated JSON array".into()))?;
            if end < start {
                return Err(GeneratorError::InvalidOutput("unterminated JSON array".into()));
            }
            &trimmed[start..=end]
        }
        None => {
            return Err(GeneratorError::InvalidOutput(format!(
                "no JSON array in reply: {}",
                preview(reply, 120)
            )));
        }
    };

    serde_json::from_str::<Vec<CandidateItem>>(array_text)
        .map_err(|e| GeneratorError::InvalidOutput(e.to_string()))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the fence language tag line, then the closing fence
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept() -> DepartmentConfig {
        DepartmentConfig {
            id: "d".to_string(),
            slug: "story".to_string(),
            name: "Story".to_string(),
            description: "Shape the narrative arc".to_string(),
            number: 1,
            active: true,
            automation_enabled: true,
            quality_threshold: None,
            model: None,
        }
    }

    #[test]
    fn parses_bare_json_array() {
        let reply = r#"[{"content": "long text", "summary": "short", "context": "why"}]"#;
        let items = parse_item_batch(reply).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].summary, "short");
    }

    #[test]
    fn parses_fenced_json_array() {
        let reply = "```json\n[{\"content\": \"a\", \"summary\": \"b\"}]\n```";
        let items = parse_item_batch(reply).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "a");
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let reply = "Here are the items:\n[{\"content\": \"a\", \"summary\": \"b\"}]\nHope that helps!";
        // rfind(']') lands on the array's closing bracket
        let items = parse_item_batch(reply).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn rejects_reply_without_array() {
        let err = parse_item_batch("I could not generate anything today.").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidOutput(_)));
    }

    #[test]
    fn rejects_malformed_array() {
        let err = parse_item_batch("[{\"content\": }]").unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidOutput(_)));
    }

    #[test]
    fn empty_array_is_a_valid_empty_batch() {
        assert!(parse_item_batch("[]").unwrap().is_empty());
    }

    #[test]
    fn prompt_includes_cascade_and_window() {
        let cascade = vec![DepartmentRunSummary {
            department: "concept".to_string(),
            name: "Concept".to_string(),
            number: 0,
            quality_score: 88.0,
            iterations: 2,
            items_created: 7,
            threshold: 80.0,
            model: "m".to_string(),
        }];
        let context: Vec<ContextItem> = (0..30)
            .map(|i| ContextItem::new(format!("content {i}")).with_summary(format!("item {i}")))
            .collect();

        let prompt = build_prompt(&dept(), &context, &cascade);

        assert!(prompt.contains("**Concept** (Quality: 88%"));
        assert!(prompt.contains("Shape the narrative arc"));
        // Window keeps only the most recent 20 items
        assert!(!prompt.contains("item 9:"));
        assert!(prompt.contains("item 29"));
    }

    #[test]
    fn prompt_handles_first_department() {
        let prompt = build_prompt(&dept(), &[], &[]);
        assert!(prompt.contains("No previous context yet"));
        assert!(prompt.contains("No existing items yet"));
    }

    #[test]
    fn placeholder_batch_is_deterministic_and_cascade_aware() {
        let cascade = vec![DepartmentRunSummary {
            department: "concept".to_string(),
            name: "Concept".to_string(),
            number: 0,
            quality_score: 88.0,
            iterations: 2,
            items_created: 7,
            threshold: 80.0,
            model: "m".to_string(),
        }];

        let first = placeholder_batch(&dept(), &cascade);
        let second = placeholder_batch(&dept(), &cascade);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first[0].content.contains("Carries forward themes from Concept"));

        let without_cascade = placeholder_batch(&dept(), &[]);
        assert!(!without_cascade[0].content.contains("Carries forward"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_placeholders() {
        // Bind and drop to get a port nothing is listening on
        let dead = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = dead.local_addr().unwrap();
        drop(dead);

        let generator =
            LlmContentGenerator::new(ChatClient::new(format!("http://{addr}"), None));
        let items = generator
            .generate(&dept(), &[], &[], "any-model")
            .await
            .unwrap();

        assert_eq!(items.len(), 3);
        assert!(items[0].summary.starts_with("Placeholder item 1"));
    }
}
