use leakprobe_core::ErrorKind;

use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    ProcessNotFound(anyhow::Error),
    Database(anyhow::Error),
    InvalidInput(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ProcessNotFound(_) => ExitCode::ProcessNotFound,
            Self::Database(_) => ExitCode::DatabaseError,
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::ProcessNotFound(e)
            | Self::Database(e)
            | Self::InvalidInput(e)
            | Self::RuntimeError(e) => e,
        }
    }
}

impl From<leakprobe_core::Error> for RunError {
    fn from(err: leakprobe_core::Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::ProcessNotFound | ErrorKind::WorkerNotFound | ErrorKind::ProcessGone => {
                Self::ProcessNotFound
            }
            ErrorKind::Database | ErrorKind::Statement => Self::Database,
            ErrorKind::InvalidIdentifier | ErrorKind::InvalidWorkload => Self::InvalidInput,
            ErrorKind::Scratch => Self::RuntimeError,
        };
        kind(anyhow::Error::new(err))
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
