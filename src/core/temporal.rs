//! Due-date resolution from natural-language cues.
//!
//! Language models often return a due date that has already passed when the
//! input said something relative like "next Friday". [`resolve`] repairs
//! those dates from cues in the original text, relative to an injected
//! reference time. All arithmetic is in UTC.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc, Weekday};
use regex::Regex;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn next_weekday_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bnext\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)")
            .expect("weekday pattern is valid")
    })
}

/// Resolve a candidate due date against cues in `input`.
///
/// A candidate strictly after `now` is returned unchanged. Otherwise the
/// first matching cue wins: "next <weekday>", then "tomorrow", then
/// "next week". With no cue the candidate is returned as given, even if it
/// is in the past or absent.
///
/// An absent candidate is also filled from a cue, so a reply with no date
/// for "call Bob tomorrow" still gets tomorrow at 23:59. Callers that only
/// want to repair dates the model actually returned should skip this for
/// `None`.
pub fn resolve(
    candidate: Option<DateTime<Utc>>,
    input: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if let Some(date) = candidate {
        if date > now {
            return Some(date);
        }
    }

    if let Some(caps) = next_weekday_pattern().captures(input) {
        if let Ok(target) = caps[1].parse::<Weekday>() {
            if let Some(date) = next_occurrence(now, target) {
                return Some(date);
            }
        }
    }

    let lower = input.to_lowercase();
    let offset_days = if lower.contains("tomorrow") {
        Some(1)
    } else if lower.contains("next week") {
        Some(7)
    } else {
        None
    };

    if let Some(days) = offset_days {
        if let Some(date) = now
            .date_naive()
            .checked_add_days(Days::new(days))
            .and_then(end_of_day)
        {
            return Some(date);
        }
    }

    candidate
}

/// Next occurrence of `target` at 23:59, never today
fn next_occurrence(now: DateTime<Utc>, target: Weekday) -> Option<DateTime<Utc>> {
    let today = now.weekday().num_days_from_sunday();
    let target = target.num_days_from_sunday();
    let mut days_until = (target + 7 - today) % 7;
    if days_until == 0 {
        days_until = 7;
    }
    now.date_naive()
        .checked_add_days(Days::new(days_until as u64))
        .and_then(end_of_day)
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}
