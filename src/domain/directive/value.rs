//! Discriminated `DirectiveValue` union (`spec.md` §3).

use std::collections::BTreeSet;

use chrono::Weekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    File,
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagesMode {
    #[default]
    Auto,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDirective {
    pub scheme: Scheme,
    pub target: String,
    pub refs_only: bool,
    pub required: bool,
    pub images: ImagesMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    New,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirective {
    pub scheme: Scheme,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDirective {
    pub alias: String,
    pub thinking: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsDirective {
    All,
    None,
    Named(BTreeSet<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDirective {
    TtlSeconds(u64),
    Session,
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunOnDirective {
    #[default]
    Daily,
    Never,
    Days(DaySet),
}

/// A small fixed-size weekday set (avoids pulling in a bitflags dep for 7 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DaySet(u8);

impl DaySet {
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut set = Self::default();
        for d in days {
            set.insert(d);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughRuns {
    All,
    N(u32),
}

/// A fully-parsed directive value, keyed by directive name in a `DirectiveMap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    Input(InputDirective),
    Output(OutputDirective),
    Header(String),
    Model(ModelDirective),
    Tools(ToolsDirective),
    WriteMode(WriteMode),
    RunOn(RunOnDirective),
    Cache(CacheDirective),
    RecentRuns(u32),
    RecentSummaries(u32),
    TokenThreshold(u32),
    PassthroughRuns(PassthroughRuns),
}
