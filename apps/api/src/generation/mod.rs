// Content generation: format table, prompt assembly, and the single LLM call.
// All LLM calls go through the `TextGenerator` seam in llm_client.

pub mod builder;
pub mod formats;
pub mod generator;
pub mod handlers;
pub mod prompts;
