#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Completed, interrupted gracefully, or finished an expectation run.
    Success = 0,

    /// The server process (or its attachment worker) could not be found, or vanished mid-run.
    ProcessNotFound = 10,

    /// Database creation/attachment or a workload statement failed.
    DatabaseError = 20,

    /// Invalid CLI input (bad flags, zero batch size, unknown scenario, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors on the scratch database, missing backend).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
