// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every system prompt that expects a JSON object back.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Instruction used by every extraction prompt so the model never pads sparse input.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Use ONLY information present in the provided input or the sources named. \
    If a detail is not available, leave the field null or an empty list rather than guessing.";

/// Joins a role description with the JSON-only fragment.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}
