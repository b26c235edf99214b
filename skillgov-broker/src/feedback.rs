use skillgov_context::MenuEntry;

/// Feedback block appended to the retry prompt after a validation
/// rejection. Includes the current menu with infeasible options marked, so
/// the model can steer toward a legal choice.
pub fn validation_feedback(message: &str, menu: &[MenuEntry]) -> String {
    format!(
        "Your previous proposal was rejected: {message}. Here is the current feasible menu:\n{}",
        skillgov_context::render_feasible_menu(menu)
    )
}

/// Hint appended to the retry prompt after a parse failure.
pub fn parse_hint(message: &str) -> String {
    format!(
        "Your previous output could not be used: {message}. Respond with exactly one JSON \
         object matching the schema, with no surrounding commentary."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_feedback_lists_menu() {
        let menu = vec![
            MenuEntry {
                skill_id: "do_nothing".to_string(),
                display_name: "Do nothing".to_string(),
                description: "Take no action".to_string(),
                infeasible: None,
            },
            MenuEntry {
                skill_id: "elevate_house".to_string(),
                display_name: "Elevate house".to_string(),
                description: "Raise the structure".to_string(),
                infeasible: Some("elevated is false".to_string()),
            },
        ];
        let block = validation_feedback("chose an unavailable skill", &menu);
        assert!(block.contains("was rejected: chose an unavailable skill"));
        assert!(block.contains("do_nothing"));
        assert!(block.contains("[INFEASIBLE: elevated is false]"));
    }

    #[test]
    fn test_parse_hint_mentions_schema() {
        let hint = parse_hint("output is not valid JSON");
        assert!(hint.contains("JSON"));
    }
}
