//! Trigger preparation errors (`spec.md` §4.5, §7).

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TriggerError {
    #[error("invalid cron expression '{0}'")]
    InvalidCron(String),

    #[error("invalid one-time datetime '{0}': {1}")]
    InvalidOnceDatetime(String, String),

    #[error("one-time trigger '{0}' is in the past")]
    OnceInPast(String),

    #[error("one-time trigger '{0}' uses a relative term, which is not supported")]
    RelativeOnceTerm(String),
}
