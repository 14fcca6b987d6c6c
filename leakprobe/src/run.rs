use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use leakprobe_core::{
    ProcessTarget, RunContext, Scenario, SysinfoProcessTable, WorkloadSpec, run_workload,
};

use crate::backend;
use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output::HumanOutput;
use crate::run_error::RunError;

pub(crate) fn run(args: RunArgs, stop: Arc<AtomicBool>) -> Result<ExitCode, RunError> {
    let spec = workload_spec(&args);
    let target = ProcessTarget {
        name: args.name_match(),
        topology: args.arch.into(),
        allow_missing: args.allow_missing_process,
    };
    log::debug!(
        "workload {} with {} commits, target {:?}",
        spec.scenario,
        spec.commit,
        target
    );

    let connector = backend::connector(args.connection.options())?;
    let mut processes = SysinfoProcessTable::new();
    let mut ctx = RunContext {
        connector: connector.as_ref(),
        processes: &mut processes,
        target,
        stop,
    };

    let out = HumanOutput::new(spec.scenario);
    out.print_header(&spec);
    let summary = run_workload(&mut ctx, &spec, &mut |p| out.progress(p))?;
    out.print_summary(&summary);

    if summary.interrupted {
        log::info!("run interrupted after {} batches", summary.batches);
    }
    Ok(ExitCode::Success)
}

fn workload_spec(args: &RunArgs) -> WorkloadSpec {
    let mut spec = WorkloadSpec::new(Scenario::from(args.scenario));
    if let Some(n) = args.iterations {
        spec.iterations = n;
    }
    if let Some(n) = args.batch_size {
        spec.batch_size = n;
    }
    if let Some(path) = &args.database {
        spec.database = path.clone();
    }
    spec.commit = args.commit.into();
    spec.trace_statements = args.trace_statements;
    spec.reuse_database = args.reuse_database;
    if args.cleanup {
        spec.cleanup = true;
    }
    if args.keep_database {
        spec.cleanup = false;
    }
    spec
}
