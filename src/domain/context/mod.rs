//! Context Manager domain logic: templates, cache keys, and per-turn
//! prompt assembly (`spec.md` §4.7).

mod pipeline;
mod record;
mod template;

pub use pipeline::{compiled_summary_message, estimate_tokens, last_non_tool_turns, render_manager_prompt, should_skip_for_threshold};
pub use record::{ContextCacheEntry, ContextCacheKey, ContextSummaryRecord};
pub use template::{parse_context_template, ContextTemplate};
