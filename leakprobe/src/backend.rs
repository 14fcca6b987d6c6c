use leakprobe_core::{ConnectOptions, Connector};

use crate::run_error::RunError;

#[cfg(feature = "firebird")]
pub(crate) fn connector(opts: ConnectOptions) -> Result<Box<dyn Connector>, RunError> {
    log::debug!("using firebird backend at {}", opts.host);
    Ok(Box::new(leakprobe_firebird::FirebirdConnector::new(opts)))
}

#[cfg(not(feature = "firebird"))]
pub(crate) fn connector(_opts: ConnectOptions) -> Result<Box<dyn Connector>, RunError> {
    Err(RunError::RuntimeError(anyhow::anyhow!(
        "no database backend compiled in (rebuild with `--features firebird`)"
    )))
}
