//! Content generation: orchestrates one request end to end.
//!
//! Flow: validate → resolve format → extract references per category →
//!       budgeted prompt → one LLM call → `GeneratedContent`.

use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::extract_category_text;
use crate::generation::builder::{build_budgeted_prompt, ReferenceTexts, DEFAULT_PROMPT_TOKEN_BUDGET};
use crate::generation::formats::resolve_format;
use crate::llm_client::{GenerationParams, TextGenerator};
use crate::models::{Category, GeneratedContent, UploadedFile};

/// Floor for the response budget so short formats are not cut off mid-sentence.
const MIN_RESPONSE_TOKENS: u32 = 1024;

/// Everything one generation needs. Lives for a single HTTP request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub brief: String,
    pub format_key: String,
    /// Raw form value; only honoured for the custom format.
    pub custom_word_count: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.brief.trim().is_empty() {
            return Err(AppError::Validation("Brief is required".to_string()));
        }
        if self.format_key.trim().is_empty() {
            return Err(AppError::Validation("Format is required".to_string()));
        }
        Ok(())
    }
}

/// Response token budget: about two tokens per target word, capped by configuration.
pub fn max_tokens_for(word_count: u32, configured_max: u32) -> u32 {
    word_count
        .saturating_mul(2)
        .max(MIN_RESPONSE_TOKENS)
        .min(configured_max)
}

/// Runs the generation pipeline. Extraction failures of individual files are
/// inlined into the prompt; an API failure aborts with `AppError::Generation`.
pub async fn generate_content(
    generator: &dyn TextGenerator,
    model: &str,
    configured_max_tokens: u32,
    request: &GenerationRequest,
) -> Result<GeneratedContent, AppError> {
    request.validate()?;

    let format = resolve_format(request.format_key.trim(), request.custom_word_count.as_deref());

    let mut references = ReferenceTexts::default();
    for category in Category::ALL {
        let files: Vec<UploadedFile> = request
            .files
            .iter()
            .filter(|f| f.category == category)
            .cloned()
            .collect();
        references.set(category, extract_category_text(&files, None).await);
    }

    let prompt = build_budgeted_prompt(
        &request.brief,
        &format,
        &references,
        DEFAULT_PROMPT_TOKEN_BUDGET,
    );

    let params = GenerationParams {
        model: model.to_string(),
        max_tokens: max_tokens_for(format.word_count, configured_max_tokens),
    };
    info!(
        "Generating {} with {} reference files (model: {}, max_tokens: {})",
        format.spec.key,
        request.files.len(),
        params.model,
        params.max_tokens
    );

    let text = generator.generate(&prompt, &params).await?;

    Ok(GeneratedContent {
        text: text.trim().to_string(),
        format_key: format.spec.key.to_string(),
        format_description: format.spec.description.to_string(),
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingGenerator, RecordingGenerator};
    use uuid::Uuid;

    fn request(brief: &str, format: &str) -> GenerationRequest {
        GenerationRequest {
            brief: brief.to_string(),
            format_key: format.to_string(),
            custom_word_count: None,
            files: Vec::new(),
        }
    }

    #[test]
    fn test_max_tokens_for() {
        assert_eq!(max_tokens_for(300, 4000), 1024);
        assert_eq!(max_tokens_for(1500, 4000), 3000);
        assert_eq!(max_tokens_for(2000, 4000), 4000);
        assert_eq!(max_tokens_for(2000, 500), 500);
    }

    #[tokio::test]
    async fn test_missing_brief_or_format_is_rejected() {
        let generator = RecordingGenerator::new("unused");
        for req in [request("  ", "blog_500"), request("A brief", "")] {
            let err = generate_content(&generator, "m", 4000, &req).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_uses_references_and_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join(UploadedFile::stored_name(Uuid::new_v4(), "tone.txt"));
        std::fs::write(&path, "We speak plainly.").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        let file = UploadedFile::from_stored(Category::Style, &path, &meta).unwrap();

        let generator = RecordingGenerator::new("  Generated letter.  ");
        let mut req = request("Thank our volunteers", "letter_1000");
        req.files.push(file);

        let content = generate_content(&generator, "model-x", 4000, &req).await.unwrap();
        assert_eq!(content.text, "Generated letter.");
        assert_eq!(content.format_key, "letter_1000");
        assert_eq!(content.format_description, "1,000-word letter");

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Thank our volunteers"));
        assert!(prompts[0].contains("--- From tone.txt ---\nWe speak plainly."));
        assert!(!prompts[0].contains("PAST EXAMPLES"));
        assert_eq!(generator.params()[0].model, "model-x");
        assert_eq!(generator.params()[0].max_tokens, 2000);
    }

    #[tokio::test]
    async fn test_api_failure_maps_to_generation_error() {
        let err = generate_content(&FailingGenerator, "m", 4000, &request("Brief", "linkedin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
