//! `@directive` parsing: per-directive grammars plus the section-level registry.

mod error;
mod parse_cache;
mod parse_header;
mod parse_input;
mod parse_model;
mod parse_output;
mod parse_overrides;
mod parse_run_on;
mod parse_tools;
mod parse_util;
mod parse_write_mode;
mod registry;
mod value;

pub use error::DirectiveError;
pub use registry::{parse_section_directives, split_directive_block, DirectiveMap};
pub use value::{
    CacheDirective, DaySet, DirectiveValue, ImagesMode, InputDirective, ModelDirective, OutputDirective,
    PassthroughRuns, RunOnDirective, Scheme, ToolsDirective, WriteMode,
};

pub use parse_output::normalize_md_extension;
pub use parse_run_on::matches as run_on_matches;
