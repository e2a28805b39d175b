//! Pure per-turn context manager logic (`spec.md` §4.7 steps 1-3).
//!
//! I/O (LLM invocation, cache lookup, persistence) is left to the engine;
//! this module only assembles prompts and makes truncation/skip decisions.

use crate::domain::chat::Message;

/// Rough token estimate: ~4 characters per token, matching the coarse
/// estimators used elsewhere in the pack rather than a real tokenizer.
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}

/// Whether a context step should be skipped because the full history is
/// below its token threshold (`spec.md` §4.7 step 2). `threshold = 0` never
/// skips.
pub fn should_skip_for_threshold(full_history: &[Message], token_threshold: u32) -> bool {
    if token_threshold == 0 {
        return false;
    }
    let total: u32 = full_history.iter().map(|m| estimate_tokens(&m.content)).sum();
    total < token_threshold
}

/// Render a context-manager-section prompt:
/// `[Context Instructions] + [prior M summaries] + [section body] + [last R
/// non-tool turns] + [latest user input]` (`spec.md` §4.7 step 3b).
pub fn render_manager_prompt(
    context_instructions: Option<&str>,
    prior_summaries: &[String],
    section_body: &str,
    recent_turns: &[Message],
    latest_user_input: &str,
) -> String {
    let mut parts = Vec::new();

    if let Some(instructions) = context_instructions {
        if !instructions.is_empty() {
            parts.push(instructions.to_string());
        }
    }

    if !prior_summaries.is_empty() {
        parts.push(prior_summaries.join("\n\n"));
    }

    if !section_body.trim().is_empty() {
        parts.push(section_body.trim().to_string());
    }

    if !recent_turns.is_empty() {
        let turns = recent_turns
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(turns);
    }

    if !latest_user_input.is_empty() {
        parts.push(latest_user_input.to_string());
    }

    parts.join("\n\n")
}

/// The system message injected ahead of the passthrough slice
/// (`spec.md` §4.7 step 3e).
pub fn compiled_summary_message(summary: &str) -> String {
    format!("Context summary (compiled): {summary}")
}

/// Last `r` non-tool turns for Context Manager recent-run inclusion. `r = 0`
/// disables recent-run inclusion (`spec.md` §4.7 step 3a).
pub fn last_non_tool_turns(messages: &[Message], r: u32) -> Vec<Message> {
    if r == 0 {
        return Vec::new();
    }
    let mut selected: Vec<Message> = messages.iter().filter(|m| !m.is_tool()).rev().take(r as usize).cloned().collect();
    selected.reverse();
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::Role;
    use chrono::Utc;

    fn msg(role: Role, content: &str) -> Message {
        Message::new(role, content, Utc::now())
    }

    #[test]
    fn zero_threshold_never_skips() {
        assert!(!should_skip_for_threshold(&[], 0));
    }

    #[test]
    fn below_threshold_skips_section() {
        let history = vec![msg(Role::User, "hi")];
        assert!(should_skip_for_threshold(&history, 1000));
    }

    #[test]
    fn above_threshold_does_not_skip() {
        let history = vec![msg(Role::User, &"word ".repeat(500))];
        assert!(!should_skip_for_threshold(&history, 10));
    }

    #[test]
    fn zero_recent_runs_disables_inclusion() {
        let history = vec![msg(Role::User, "a"), msg(Role::Assistant, "b")];
        assert!(last_non_tool_turns(&history, 0).is_empty());
    }

    #[test]
    fn recent_turns_excludes_tool_messages_and_preserves_order() {
        let history = vec![
            msg(Role::User, "a"),
            msg(Role::ToolCall, "call"),
            msg(Role::ToolResult, "result"),
            msg(Role::Assistant, "b"),
        ];
        let turns = last_non_tool_turns(&history, 2);
        assert_eq!(turns.iter().map(|m| m.content.clone()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn manager_prompt_orders_parts_as_specified() {
        let prompt = render_manager_prompt(Some("instructions"), &["summary one".to_string()], "section body", &[], "latest input");
        let idx_instructions = prompt.find("instructions").unwrap();
        let idx_summary = prompt.find("summary one").unwrap();
        let idx_body = prompt.find("section body").unwrap();
        let idx_input = prompt.find("latest input").unwrap();
        assert!(idx_instructions < idx_summary);
        assert!(idx_summary < idx_body);
        assert!(idx_body < idx_input);
    }
}
