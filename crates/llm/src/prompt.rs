//! Prompt assembly
//!
//! Builds the context+question prompt sent to the generation endpoint.

/// Context substituted when retrieval returns no cases.
pub const EMPTY_CONTEXT: &str = "No relevant cases found.";

/// Build the generation prompt from retrieved case texts and the question.
///
/// Retrieved cases are joined with blank lines; zero cases fall back to the
/// fixed [`EMPTY_CONTEXT`] placeholder rather than an empty context block.
pub fn build_prompt(cases: &[String], question: &str) -> String {
    let context = if cases.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        cases.join("\n\n")
    };

    format!("Context: {context}\n\nQuestion: {question}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_format() {
        let cases = vec!["Case one.".to_string(), "Case two.".to_string()];
        let prompt = build_prompt(&cases, "What is wrong?");
        assert_eq!(
            prompt,
            "Context: Case one.\n\nCase two.\n\nQuestion: What is wrong?\n\nAnswer:"
        );
    }

    #[test]
    fn test_empty_context_placeholder() {
        let prompt = build_prompt(&[], "What is wrong?");
        assert!(prompt.starts_with("Context: No relevant cases found."));
    }
}
