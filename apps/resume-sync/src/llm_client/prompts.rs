// Shared prompt fragments.
// Each job that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction that enforces a single JSON object as the whole response.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    Return ONLY a valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that forbids inventing data absent from the document.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only extract what the document states. \
    Do NOT infer, interpolate, or invent details.";
