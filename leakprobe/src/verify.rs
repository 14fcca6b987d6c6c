use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leakprobe_core::{Tally, charset_default_cases, remove_scratch, run_cases};

use crate::backend;
use crate::cli::VerifyArgs;
use crate::exit_codes::ExitCode;
use crate::output::{print_case, print_tally};
use crate::run_error::RunError;

/// Verdicts never affect the exit code; only failing to get a database does.
pub(crate) fn verify(args: VerifyArgs, stop: Arc<AtomicBool>) -> Result<ExitCode, RunError> {
    let connector = backend::connector(args.connection.options())?;

    remove_scratch(&args.database)?;
    let mut conn = connector.create_database(&args.database).map_err(|e| {
        RunError::Database(anyhow::Error::new(e).context(format!(
            "failed to create database {}",
            args.database.display()
        )))
    })?;

    let cases = charset_default_cases();
    let outcomes = run_cases(conn.as_mut(), &cases, &stop, &mut print_case);

    if let Err(err) = conn.close() {
        log::warn!("failed to close connection: {err}");
    }
    if !args.keep_database {
        remove_scratch(&args.database)?;
    }

    let interrupted = stop.load(Ordering::Relaxed) && outcomes.len() < cases.len();
    print_tally(&Tally::of(&outcomes), interrupted);
    Ok(ExitCode::Success)
}
