mod support;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use leakprobe_core::{
    Case, CaseOutcome, Connection, Connector, Tally, Verdict, charset_default_cases, run_cases,
};
use support::{FakeConnector, Shared, world};

/// The documented UTF8 default-length sequence: statement and the fragment
/// its error must contain, or `None` when the statement must succeed.
const DOCUMENTED: [(&str, Option<&str>); 16] = [
    (
        "recreate table test(nm varchar(1) character set utf8 default 'qwerty' not null)",
        Some("expected length 1, actual 6"),
    ),
    (
        "recreate table test(nm varchar(1) character set utf8 default '€€€€€€' not null)",
        Some("expected length 1, actual 6"),
    ),
    (
        "create domain dm_ascii varchar(1) character set utf8 default 'qwertyu' not null",
        None,
    ),
    (
        "create domain dm_utf8 varchar(1) character set utf8 default '€€€€€€€' not null",
        None,
    ),
    (
        "recreate table test(nm dm_ascii)",
        Some("expected length 1, actual 7"),
    ),
    (
        "recreate table test(nm dm_utf8)",
        Some("expected length 1, actual 7"),
    ),
    (
        "create domain dm_utf8_nullable varchar(1) character set utf8 default '€€€€€€€€'",
        None,
    ),
    (
        "recreate table test(nm dm_utf8_nullable not null)",
        Some("expected length 1, actual 8"),
    ),
    ("recreate table test(nm dm_utf8_nullable)", None),
    (
        "alter domain dm_utf8_nullable set not null",
        Some("expected length 1, actual 8"),
    ),
    ("recreate table test(id int)", None),
    (
        "alter domain dm_utf8_nullable set not null",
        Some("expected length 1, actual 8"),
    ),
    (
        "alter table test add nm2 varchar(1) character set utf8 default '€€' not null",
        Some("expected length 1, actual 2"),
    ),
    (
        "alter table test add nm3 varchar(1) character set utf8 default '€€€', alter nm3 set not null",
        Some("expected length 1, actual 3"),
    ),
    (
        "alter table test add nm4 varchar(3) character set utf8 default '€€€', alter nm4 type varchar(4), alter nm4 set default '€€€€€', alter nm4 set not null",
        Some("expected length 4, actual 5"),
    ),
    (
        "alter table test add nm5 varchar(1) character set utf8, alter nm5 type dm_utf8_nullable",
        Some("expected length 1, actual 8"),
    ),
];

fn truncation(fragment: &str) -> String {
    format!(
        "arithmetic exception, numeric overflow, or string truncation\n-string right truncation\n-{fragment}"
    )
}

/// A server that answers every documented statement exactly as documented.
fn conforming_server() -> Shared {
    let w = world();
    for (sql, fragment) in DOCUMENTED {
        if let Some(fragment) = fragment {
            w.borrow_mut()
                .failures
                .insert(sql.to_string(), truncation(fragment));
        }
    }
    w
}

fn connect(w: &Shared) -> Box<dyn Connection> {
    FakeConnector { world: w.clone() }
        .create_database(Path::new("/nonexistent/failed_test.fdb"))
        .unwrap_or_else(|e| panic!("connect: {e}"))
}

fn run(w: &Shared, cases: &[Case]) -> Vec<CaseOutcome> {
    let mut conn = connect(w);
    let mut seen = 0;
    let outcomes = run_cases(conn.as_mut(), cases, &AtomicBool::new(false), &mut |_| {
        seen += 1
    });
    assert_eq!(seen, cases.len());
    outcomes
}

#[test]
fn builtin_cases_match_documented_sequence() {
    let got: Vec<(String, Option<String>)> = charset_default_cases()
        .into_iter()
        .map(|c| (c.sql, c.expected))
        .collect();
    let want: Vec<(String, Option<String>)> = DOCUMENTED
        .iter()
        .map(|(sql, fragment)| (sql.to_string(), fragment.map(str::to_string)))
        .collect();
    assert_eq!(got, want);
}

#[test]
fn documented_sequence_yields_documented_verdicts() {
    let cases = charset_default_cases();
    let w = conforming_server();
    let outcomes = run(&w, &cases);

    assert_eq!(outcomes.len(), 16);
    for (outcome, (_, fragment)) in outcomes.iter().zip(DOCUMENTED) {
        let want = match fragment {
            Some(fragment) => Verdict::Expected {
                fragment: fragment.to_string(),
            },
            None => Verdict::Correct,
        };
        assert_eq!(outcome.verdict, want, "case #{}", outcome.index);
    }
    assert_eq!(
        outcomes[0].verdict,
        Verdict::Expected {
            fragment: "expected length 1, actual 6".to_string()
        }
    );
    assert_eq!(outcomes[2].verdict, Verdict::Correct);
    assert_eq!(outcomes[3].verdict, Verdict::Correct);
    assert_eq!(
        outcomes[7].verdict,
        Verdict::Expected {
            fragment: "expected length 1, actual 8".to_string()
        }
    );
    assert_eq!(outcomes[8].verdict, Verdict::Correct);
    assert_eq!(
        outcomes[14].verdict,
        Verdict::Expected {
            fragment: "expected length 4, actual 5".to_string()
        }
    );
    assert_eq!(
        Tally::of(&outcomes),
        Tally {
            passed: 16,
            failed: 0
        }
    );

    let indexes: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indexes, (1..=16).collect::<Vec<_>>());
}

#[test]
fn every_case_runs_even_after_failures() {
    let cases = charset_default_cases();
    let w = conforming_server();
    {
        let mut b = w.borrow_mut();
        // Regression: the byte-length check is gone for the first case.
        b.failures.remove(&cases[0].sql);
        // The server counts bytes instead of characters.
        b.failures
            .insert(cases[4].sql.clone(), truncation("expected length 1, actual 21"));
        // A case that should succeed fails.
        b.failures
            .insert(cases[2].sql.clone(), "unsuccessful metadata update".to_string());
    }

    let outcomes = run(&w, &cases);

    assert_eq!(w.borrow().executed().len(), 16);
    assert_eq!(
        outcomes[0].verdict,
        Verdict::IncorrectBehavior {
            expected: "expected length 1, actual 6".to_string()
        }
    );
    assert_eq!(
        outcomes[2].verdict,
        Verdict::UnexpectedError {
            actual: "unsuccessful metadata update".to_string()
        }
    );
    match &outcomes[4].verdict {
        Verdict::Mismatch { expected, actual } => {
            assert_eq!(expected, "expected length 1, actual 7");
            assert!(actual.contains("actual 21"));
        }
        other => panic!("expected mismatch, got {other:?}"),
    }
    assert_eq!(
        Tally::of(&outcomes),
        Tally {
            passed: 13,
            failed: 3
        }
    );
}

#[test]
fn successful_cases_are_committed() {
    let w = world();
    let cases = vec![Case::ok("create table a(id int)"), Case::ok("drop table a")];
    let outcomes = run(&w, &cases);

    assert!(outcomes.iter().all(|o| o.verdict == Verdict::Correct));
    assert_eq!(w.borrow().count(&support::Event::Commit), 2);
}

#[test]
fn stop_flag_ends_the_run_between_cases() {
    let cases = charset_default_cases();
    let w = conforming_server();
    let mut conn = connect(&w);
    let stop = AtomicBool::new(false);

    let outcomes = run_cases(conn.as_mut(), &cases, &stop, &mut |o| {
        if o.index == 4 {
            stop.store(true, Ordering::Relaxed);
        }
    });
    conn.close().unwrap_or_else(|e| panic!("close: {e}"));

    assert_eq!(outcomes.len(), 4);
    let world = w.borrow();
    assert_eq!(world.executed().len(), 4);
    assert_eq!(world.events.last(), Some(&support::Event::Close));
}
