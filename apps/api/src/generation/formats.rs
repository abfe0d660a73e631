//! Static catalogue of content formats offered in the form.

use serde::Serialize;
use tracing::warn;

/// Read-only metadata for one content format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSpec {
    pub key: &'static str,
    pub description: &'static str,
    pub word_count: u32,
    pub characteristics: &'static str,
}

pub const CUSTOM_FORMAT_KEY: &str = "custom";

pub const FORMATS: &[FormatSpec] = &[
    FormatSpec {
        key: "speech_15min",
        description: "15-minute speech",
        word_count: 2000,
        characteristics: "conversational, engaging, with clear sections and natural transitions",
    },
    FormatSpec {
        key: "letter_1000",
        description: "1,000-word letter",
        word_count: 1000,
        characteristics: "formal, structured, with a clear introduction and conclusion",
    },
    FormatSpec {
        key: "blog_500",
        description: "500-word blog post",
        word_count: 500,
        characteristics: "informative, engaging, with a compelling headline and clear takeaways",
    },
    FormatSpec {
        key: "linkedin",
        description: "LinkedIn post",
        word_count: 300,
        characteristics: "professional, concise, with a hook and call-to-action",
    },
    FormatSpec {
        key: "press_release",
        description: "Press release",
        word_count: 800,
        characteristics: "formal, factual, with quotes and a clear news angle",
    },
    FormatSpec {
        key: "exec_summary",
        description: "Executive summary",
        word_count: 500,
        characteristics: "concise, data-driven, highlighting key points and recommendations",
    },
    FormatSpec {
        key: CUSTOM_FORMAT_KEY,
        description: "Custom format",
        word_count: 1000,
        characteristics: "well-structured and professional",
    },
];

pub fn find_format(key: &str) -> Option<&'static FormatSpec> {
    FORMATS.iter().find(|f| f.key == key)
}

fn custom_format() -> FormatSpec {
    // `custom` is always present in FORMATS
    FORMATS[FORMATS.len() - 1]
}

/// A format spec with the target word count settled for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub spec: FormatSpec,
    pub word_count: u32,
}

/// Looks up `key`, falling back to the custom format for unknown keys.
///
/// `custom_word_count` only applies to the custom format; values that are not
/// a positive integer are ignored.
pub fn resolve_format(key: &str, custom_word_count: Option<&str>) -> ResolvedFormat {
    let spec = match find_format(key) {
        Some(spec) => *spec,
        None => {
            warn!("Unknown format '{key}', using custom format");
            custom_format()
        }
    };

    let mut word_count = spec.word_count;
    if spec.key == CUSTOM_FORMAT_KEY {
        if let Some(raw) = custom_word_count.map(str::trim).filter(|s| !s.is_empty()) {
            match raw.parse::<u32>() {
                Ok(n) if n > 0 => word_count = n,
                _ => warn!("Invalid custom word count: {raw}. Using default."),
            }
        }
    }

    ResolvedFormat { spec, word_count }
}
