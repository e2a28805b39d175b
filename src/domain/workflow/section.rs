//! `Workflow`, `Section`, and the frontmatter fields that drive scheduling.

use chrono::Weekday;

use crate::domain::directive::DirectiveMap;
use crate::domain::identifiers::WorkflowGlobalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Step,
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleSpec {
    None,
    Cron(String),
    Once(String),
}

/// A single `##`-heading section of a workflow file: its raw body (directives
/// not yet parsed) plus the heading text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub name: String,
    pub body: String,
}

/// A section after directive parsing: the `DirectiveMap` plus the remaining
/// prompt template text.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub directives: DirectiveMap,
    pub body_template: String,
}

impl Section {
    /// Whether this section's `@run-on` directive matches the given weekday.
    pub fn runs_on(&self, day: Weekday) -> bool {
        crate::domain::directive::run_on_matches(self.directives.run_on, day)
    }
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub global_id: WorkflowGlobalId,
    pub engine_kind: EngineKind,
    pub schedule_spec: ScheduleSpec,
    pub enabled: bool,
    pub week_start_day: Weekday,
    pub description: String,
    pub sections: Vec<RawSection>,
    pub source_hash: String,
}
