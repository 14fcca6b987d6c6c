mod backend;
mod cli;
mod exit_codes;
mod output;
mod run;
mod run_error;
mod verify;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

const SECOND_INTERRUPT_EXIT: i32 = 130;

fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    exit_codes::ExitCode::Success.as_i32()
                }
                _ => exit_codes::ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let stop = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(stop.clone());

    let result = match cli.command {
        cli::Command::Run(args) => run::run(args, stop),
        cli::Command::Verify(args) => verify::verify(args, stop),
    };

    let code = match result {
        Ok(code) => code.as_i32(),
        Err(err) => {
            eprintln!("{err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}

/// First Ctrl-C asks the run to stop at the next iteration or case; a second
/// one exits immediately without closing the connection.
fn install_interrupt_handler(stop: Arc<AtomicBool>) {
    let res = ctrlc::set_handler(move || {
        if stop.swap(true, Ordering::SeqCst) {
            std::process::exit(SECOND_INTERRUPT_EXIT);
        }
        eprintln!("interrupt received, stopping (press Ctrl-C again to exit immediately)");
    });
    if let Err(err) = res {
        log::warn!("failed to install Ctrl-C handler: {err}");
    }
}
