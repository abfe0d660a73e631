//! Prompt Builder: brief + format + reference texts → one prompt string.
//!
//! Pure functions only: identical inputs always produce the identical prompt.

use tracing::{info, warn};

use crate::generation::formats::ResolvedFormat;
use crate::generation::prompts::{
    CLOSING_TEMPLATE, COMPETITIVE_SECTION_TEMPLATE, HEADER_TEMPLATE, PAST_SECTION_TEMPLATE,
    STYLE_SECTION_TEMPLATE, TRUNCATION_NOTE_TEMPLATE,
};
use crate::models::Category;

/// Total prompt budget used by the web front end, leaving room for the response.
pub const DEFAULT_PROMPT_TOKEN_BUDGET: usize = 8000;
/// Reserved for instructions and section headers.
const STRUCTURE_TOKENS: usize = 500;
/// Upper bound reserved for the brief.
const MAX_BRIEF_TOKENS: usize = 1500;
/// Rough English average.
const CHARS_PER_TOKEN: usize = 4;

/// Extracted reference text per category. Empty text means "no examples".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTexts {
    pub style: String,
    pub past: String,
    pub competitive: String,
}

impl ReferenceTexts {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Style => &self.style,
            Category::Past => &self.past,
            Category::Competitive => &self.competitive,
        }
    }

    pub fn set(&mut self, category: Category, text: String) {
        match category {
            Category::Style => self.style = text,
            Category::Past => self.past = text,
            Category::Competitive => self.competitive = text,
        }
    }
}

fn section_template(category: Category) -> &'static str {
    match category {
        Category::Style => STYLE_SECTION_TEMPLATE,
        Category::Past => PAST_SECTION_TEMPLATE,
        Category::Competitive => COMPETITIVE_SECTION_TEMPLATE,
    }
}

fn section_label(category: Category) -> &'static str {
    match category {
        Category::Style => "writing style examples",
        Category::Past => "past examples",
        Category::Competitive => "competitive examples",
    }
}

fn fill_format(template: &str, format: &ResolvedFormat) -> String {
    template
        .replace("{description}", format.spec.description)
        .replace("{word_count}", &format.word_count.to_string())
        .replace("{characteristics}", format.spec.characteristics)
}

/// Assembles the prompt. Sections with empty reference text are omitted.
pub fn construct_prompt(brief: &str, format: &ResolvedFormat, references: &ReferenceTexts) -> String {
    let mut prompt = fill_format(HEADER_TEMPLATE, format).replace("{brief}", brief);

    for category in Category::ALL {
        let text = references.get(category);
        if !text.is_empty() {
            prompt.push_str(&section_template(category).replace("{examples}", text));
        }
    }

    prompt.push_str(&fill_format(CLOSING_TEMPLATE, format));

    info!(
        "Constructed prompt for {} with {} characters",
        format.spec.description,
        prompt.chars().count()
    );
    prompt
}

/// Very rough token estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Keeps the first `max_tokens * 4` characters and appends a truncation note.
pub fn truncate_to_tokens(text: &str, max_tokens: usize, section: &str) -> String {
    let estimated = estimate_tokens(text);
    if estimated <= max_tokens {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_tokens * CHARS_PER_TOKEN).collect();
    truncated.push_str(&TRUNCATION_NOTE_TEMPLATE.replace("{section}", section));

    warn!("Truncated {section} from {estimated} to {max_tokens} tokens");
    truncated
}

/// Builds a prompt that fits `max_total_tokens`.
///
/// Budget: structure and brief first, the remainder split evenly across the
/// categories that have reference text (the last one takes the rounding remainder).
/// The brief itself is never truncated.
pub fn build_budgeted_prompt(
    brief: &str,
    format: &ResolvedFormat,
    references: &ReferenceTexts,
    max_total_tokens: usize,
) -> String {
    let brief_tokens = estimate_tokens(brief).min(MAX_BRIEF_TOKENS);
    let remaining = max_total_tokens.saturating_sub(STRUCTURE_TOKENS + brief_tokens);

    let present: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|c| !references.get(*c).is_empty())
        .collect();

    let mut budgeted = ReferenceTexts::default();
    if !present.is_empty() {
        let share = remaining / present.len();
        for (i, category) in present.iter().enumerate() {
            let allowance = if i + 1 == present.len() {
                remaining - share * (present.len() - 1)
            } else {
                share
            };
            budgeted.set(
                *category,
                truncate_to_tokens(references.get(*category), allowance, section_label(*category)),
            );
        }
    }

    construct_prompt(brief, format, &budgeted)
}
