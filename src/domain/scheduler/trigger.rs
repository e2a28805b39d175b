//! Trigger preparation: validates `cron:`/`once:` schedule specs into a
//! `TriggerSpec` the synchronizer can compare and diff (`spec.md` §4.5).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;

use super::error::TriggerError;
use crate::domain::workflow::ScheduleSpec;

const RELATIVE_TERMS: &[&str] = &["today", "tomorrow", "yesterday", "now", "this-week", "next-week", "last-week"];

/// A prepared, validated trigger ready for registration with the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSpec {
    Cron(String),
    Once(DateTime<Utc>),
}

impl TriggerSpec {
    /// String form used for diffing against the persisted job table
    /// (`spec.md` §4.5 step 3: `str(existing.trigger) != str(new.trigger)`).
    pub fn as_trigger_string(&self) -> String {
        match self {
            TriggerSpec::Cron(expr) => format!("cron:{expr}"),
            TriggerSpec::Once(dt) => format!("once:{}", dt.to_rfc3339()),
        }
    }
}

/// Prepare a trigger from a workflow's schedule spec. Returns `Ok(None)` for
/// `ScheduleSpec::None` (the workflow is manual-only; no job is created).
pub fn prepare(spec: &ScheduleSpec, now: DateTime<Utc>) -> Result<Option<TriggerSpec>, TriggerError> {
    match spec {
        ScheduleSpec::None => Ok(None),
        ScheduleSpec::Cron(expr) => {
            let cron_expr = normalize_cron(expr);
            Schedule::from_str(&cron_expr).map_err(|_| TriggerError::InvalidCron(expr.clone()))?;
            Ok(Some(TriggerSpec::Cron(expr.clone())))
        }
        ScheduleSpec::Once(raw) => {
            let trimmed = raw.trim();
            if RELATIVE_TERMS.iter().any(|term| trimmed.eq_ignore_ascii_case(term)) {
                return Err(TriggerError::RelativeOnceTerm(raw.clone()));
            }
            let parsed = DateTime::parse_from_rfc3339(trimmed)
                .map_err(|err| TriggerError::InvalidOnceDatetime(raw.clone(), err.to_string()))?
                .with_timezone(&Utc);
            if parsed <= now {
                return Err(TriggerError::OnceInPast(raw.clone()));
            }
            Ok(Some(TriggerSpec::Once(parsed)))
        }
    }
}

/// The `cron` crate expects 6 or 7 fields (seconds-first); workflow files use
/// the conventional 5-field crontab format, so a leading `0` seconds field is
/// prepended before validation.
fn normalize_cron(expr: &str) -> String {
    let field_count = expr.split_whitespace().count();
    if field_count == 5 {
        format!("0 {expr}")
    } else {
        expr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 27, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_schedule_means_no_trigger() {
        assert_eq!(prepare(&ScheduleSpec::None, now()).unwrap(), None);
    }

    #[test]
    fn valid_five_field_cron_is_accepted() {
        let spec = ScheduleSpec::Cron("0 9 * * *".to_string());
        let trigger = prepare(&spec, now()).unwrap().unwrap();
        assert_eq!(trigger.as_trigger_string(), "cron:0 9 * * *");
    }

    #[test]
    fn invalid_cron_is_rejected() {
        let spec = ScheduleSpec::Cron("not a cron".to_string());
        assert!(matches!(prepare(&spec, now()), Err(TriggerError::InvalidCron(_))));
    }

    #[test]
    fn future_once_datetime_is_accepted() {
        let spec = ScheduleSpec::Once("2026-08-01T09:00:00Z".to_string());
        let trigger = prepare(&spec, now()).unwrap().unwrap();
        assert!(matches!(trigger, TriggerSpec::Once(_)));
    }

    #[test]
    fn past_once_datetime_is_rejected() {
        let spec = ScheduleSpec::Once("2020-01-01T00:00:00Z".to_string());
        assert!(matches!(prepare(&spec, now()), Err(TriggerError::OnceInPast(_))));
    }

    #[test]
    fn relative_once_term_is_rejected() {
        let spec = ScheduleSpec::Once("tomorrow".to_string());
        assert!(matches!(prepare(&spec, now()), Err(TriggerError::RelativeOnceTerm(_))));
    }
}
