// All prompt templates for content generation.
// Placeholders are replaced with `str::replace`; the brief and reference texts
// are substituted last so user text is never re-scanned for placeholders.

/// Opening instruction and brief.
/// Replace: {description}, {word_count}, {characteristics}, then {brief}.
pub const HEADER_TEMPLATE: &str = "You are an expert communications professional tasked with writing a {description} (approximately {word_count} words) that is {characteristics}.

BRIEF:
{brief}

";

/// Replace: {examples}
pub const STYLE_SECTION_TEMPLATE: &str = "
WRITING STYLE EXAMPLES:
The following examples demonstrate the desired writing style and tone. Please emulate this style in your response:

{examples}

";

/// Replace: {examples}
pub const PAST_SECTION_TEMPLATE: &str = "
PAST EXAMPLES:
The following are examples of similar content from the past. Use these for reference on structure and approach:

{examples}

";

/// Replace: {examples}
pub const COMPETITIVE_SECTION_TEMPLATE: &str = "
COMPETITIVE EXAMPLES:
The following are examples from competitors or similar organizations. Draw inspiration from these while maintaining originality:

{examples}

";

/// Closing instruction.
/// Replace: {description}, {word_count}, {characteristics}.
pub const CLOSING_TEMPLATE: &str = "
Please write a {description} based on the brief provided, incorporating the style from the examples and drawing inspiration from the competitive examples. The content should be approximately {word_count} words and should be {characteristics}.

Format your response as a complete, ready-to-use document without explanations or meta-commentary.
";

/// Appended to a reference section that was cut to fit the token budget.
/// Replace: {section}
pub const TRUNCATION_NOTE_TEMPLATE: &str =
    "\n\n[Note: The {section} content was truncated to fit within token limits.]";
