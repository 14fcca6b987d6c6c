//! Sequential expectation runner.
//!
//! Each case is a statement plus the fragment its error message must contain
//! (or `None` when it must succeed). Cases run in order on one connection and
//! a failing case never stops the run; only the stop flag does. Schema objects created by earlier
//! cases are visible to later ones, so a case list is only meaningful in its
//! declared order.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::db::Connection;
use crate::sql::Statement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub sql: String,
    pub expected: Option<String>,
}

impl Case {
    pub fn ok(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            expected: None,
        }
    }

    pub fn fails_with(sql: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            expected: Some(fragment.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Succeeded as expected.
    Correct,
    /// Failed with the expected message fragment.
    Expected { fragment: String },
    /// Succeeded but an error was expected.
    IncorrectBehavior { expected: String },
    /// Failed but success was expected.
    UnexpectedError { actual: String },
    /// Failed with a different message.
    Mismatch { expected: String, actual: String },
}

impl Verdict {
    #[must_use]
    pub fn classify(expected: Option<&str>, outcome: Result<(), &str>) -> Self {
        match (expected, outcome) {
            (None, Ok(())) => Self::Correct,
            (Some(expected), Ok(())) => Self::IncorrectBehavior {
                expected: expected.to_string(),
            },
            (None, Err(actual)) => Self::UnexpectedError {
                actual: actual.to_string(),
            },
            (Some(expected), Err(actual)) if actual.contains(expected) => Self::Expected {
                fragment: expected.to_string(),
            },
            (Some(expected), Err(actual)) => Self::Mismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, Self::Correct | Self::Expected { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correct => write!(f, "correct behaviour"),
            Self::Expected { fragment } => write!(f, "expected error: {fragment}"),
            Self::IncorrectBehavior { expected } => {
                write!(f, "incorrect behaviour: succeeded, expected error `{expected}`")
            }
            Self::UnexpectedError { actual } => write!(f, "unexpected error: {actual}"),
            Self::Mismatch { expected, actual } => {
                write!(f, "mismatch:\n    expected: {expected}\n    received: {actual}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    /// 1-based.
    pub index: usize,
    pub sql: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    #[must_use]
    pub fn of(outcomes: &[CaseOutcome]) -> Self {
        let passed = outcomes.iter().filter(|o| o.verdict.passed()).count();
        Self {
            passed,
            failed: outcomes.len() - passed,
        }
    }
}

/// Execute and commit each case in order, reporting every verdict as it lands.
///
/// `stop` is checked before every case; once set, the remaining cases are
/// skipped and only the outcomes so far are returned.
pub fn run_cases(
    conn: &mut dyn Connection,
    cases: &[Case],
    stop: &AtomicBool,
    on_case: &mut dyn FnMut(&CaseOutcome),
) -> Vec<CaseOutcome> {
    let mut outcomes = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        if stop.load(Ordering::Relaxed) {
            log::info!("interrupted before case #{}", i + 1);
            break;
        }
        let stmt = Statement::new(case.sql.as_str());
        let result = conn.execute(&stmt).and_then(|()| conn.commit());
        let verdict = Verdict::classify(
            case.expected.as_deref(),
            result.as_ref().map(|_| ()).map_err(|e| e.message()),
        );
        log::debug!("case #{}: {verdict}", i + 1);

        let outcome = CaseOutcome {
            index: i + 1,
            sql: case.sql.clone(),
            verdict,
        };
        on_case(&outcome);
        outcomes.push(outcome);
    }
    outcomes
}

/// String defaults longer than the declared `varchar` width, under UTF8.
/// Multi-byte defaults (`€`) must be measured in characters, not bytes.
#[must_use]
pub fn charset_default_cases() -> Vec<Case> {
    vec![
        Case::fails_with(
            "recreate table test(nm varchar(1) character set utf8 default 'qwerty' not null)",
            "expected length 1, actual 6",
        ),
        Case::fails_with(
            "recreate table test(nm varchar(1) character set utf8 default '€€€€€€' not null)",
            "expected length 1, actual 6",
        ),
        Case::ok("create domain dm_ascii varchar(1) character set utf8 default 'qwertyu' not null"),
        Case::ok("create domain dm_utf8 varchar(1) character set utf8 default '€€€€€€€' not null"),
        Case::fails_with("recreate table test(nm dm_ascii)", "expected length 1, actual 7"),
        Case::fails_with("recreate table test(nm dm_utf8)", "expected length 1, actual 7"),
        Case::ok("create domain dm_utf8_nullable varchar(1) character set utf8 default '€€€€€€€€'"),
        Case::fails_with(
            "recreate table test(nm dm_utf8_nullable not null)",
            "expected length 1, actual 8",
        ),
        Case::ok("recreate table test(nm dm_utf8_nullable)"),
        Case::fails_with(
            "alter domain dm_utf8_nullable set not null",
            "expected length 1, actual 8",
        ),
        Case::ok("recreate table test(id int)"),
        Case::fails_with(
            "alter domain dm_utf8_nullable set not null",
            "expected length 1, actual 8",
        ),
        Case::fails_with(
            "alter table test add nm2 varchar(1) character set utf8 default '€€' not null",
            "expected length 1, actual 2",
        ),
        Case::fails_with(
            "alter table test add nm3 varchar(1) character set utf8 default '€€€', alter nm3 set not null",
            "expected length 1, actual 3",
        ),
        Case::fails_with(
            "alter table test add nm4 varchar(3) character set utf8 default '€€€', alter nm4 type varchar(4), alter nm4 set default '€€€€€', alter nm4 set not null",
            "expected length 4, actual 5",
        ),
        Case::fails_with(
            "alter table test add nm5 varchar(1) character set utf8, alter nm5 type dm_utf8_nullable",
            "expected length 1, actual 8",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_all_four_outcomes() {
        assert_eq!(Verdict::classify(None, Ok(())), Verdict::Correct);
        assert_eq!(
            Verdict::classify(Some("actual 6"), Ok(())),
            Verdict::IncorrectBehavior {
                expected: "actual 6".to_string()
            }
        );
        assert_eq!(
            Verdict::classify(None, Err("boom")),
            Verdict::UnexpectedError {
                actual: "boom".to_string()
            }
        );
        assert_eq!(
            Verdict::classify(
                Some("expected length 1, actual 6"),
                Err("arithmetic exception, numeric overflow, or string truncation\n-string right truncation\n-expected length 1, actual 6")
            ),
            Verdict::Expected {
                fragment: "expected length 1, actual 6".to_string()
            }
        );
        assert_eq!(
            Verdict::classify(Some("actual 6"), Err("actual 7")),
            Verdict::Mismatch {
                expected: "actual 6".to_string(),
                actual: "actual 7".to_string()
            }
        );
    }

    #[test]
    fn only_correct_and_expected_pass() {
        assert!(Verdict::Correct.passed());
        assert!(
            Verdict::Expected {
                fragment: String::new()
            }
            .passed()
        );
        assert!(
            !Verdict::UnexpectedError {
                actual: String::new()
            }
            .passed()
        );
    }

    #[test]
    fn builtin_case_list_keeps_documented_order() {
        let cases = charset_default_cases();
        assert_eq!(cases.len(), 16);
        assert_eq!(
            cases[0].expected.as_deref(),
            Some("expected length 1, actual 6")
        );
        assert_eq!(cases[2].expected, None);
        assert!(cases[2].sql.starts_with("create domain dm_ascii"));
        assert_eq!(
            cases[14].expected.as_deref(),
            Some("expected length 4, actual 5")
        );
        assert!(cases.iter().all(|c| !c.sql.ends_with(';')));
    }
}
