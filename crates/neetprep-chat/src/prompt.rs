//! Tutor prompt assembly.

use neetprep_store::ContextRecord;

use crate::types::ChatMessage;

pub const TUTOR_SYSTEM_PROMPT: &str = "You are a helpful NEET exam tutor. Explain step by step, \
cite short bullet references when possible, and keep answers focused on syllabus.";

/// Render retrieval records as `[lang/topic] text` blocks separated by `---`.
pub fn format_context(records: &[ContextRecord]) -> String {
    records
        .iter()
        .map(|c| format!("[{}/{}] {}", c.lang, c.topic, c.text))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Build the two-message conversation sent upstream.
pub fn build_messages(records: &[ContextRecord], question: &str) -> Vec<ChatMessage> {
    let context = format_context(records);
    vec![
        ChatMessage::system(TUTOR_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}\nAnswer:",
            context, question
        )),
    ]
}
