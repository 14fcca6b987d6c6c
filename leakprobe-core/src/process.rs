use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub name: String,
}

/// Which server process holds the memory that matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Topology {
    /// Classic server: one worker process per attachment.
    SeparateWorker,
    /// SuperServer: attachments live inside the main process.
    SingleProcess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact(String),
    /// Case-insensitive prefix, for servers started as `firebird-<ver>` or
    /// under a wrapper that renames the process.
    Prefix(String),
}

impl NameMatch {
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(want) => name == want,
            Self::Prefix(want) => name.to_lowercase().starts_with(&want.to_lowercase()),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Prefix(s) => s,
        }
    }
}

/// Read-only view of the OS process table.
pub trait ProcessTable {
    /// Live processes, ordered by pid.
    fn processes(&mut self) -> Vec<ProcessHandle>;

    /// Resident set size in kilobytes, or `None` if the process is gone.
    fn rss_kb(&mut self, pid: u32) -> Option<u64>;
}

pub struct SysinfoProcessTable {
    sys: System,
}

impl SysinfoProcessTable {
    #[must_use]
    pub fn new() -> Self {
        let refresh = RefreshKind::nothing().with_processes(Self::refresh_kind());
        Self {
            sys: System::new_with_specifics(refresh),
        }
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing().with_memory()
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn processes(&mut self) -> Vec<ProcessHandle> {
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, Self::refresh_kind());

        let mut out: Vec<ProcessHandle> = self
            .sys
            .processes()
            .values()
            .map(|p| ProcessHandle {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
            })
            .collect();
        out.sort_by_key(|p| p.pid);
        out
    }

    fn rss_kb(&mut self, pid: u32) -> Option<u64> {
        let pid = Pid::from_u32(pid);
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, Self::refresh_kind());
        // sysinfo reports bytes.
        self.sys.process(pid).map(|p| p.memory() / 1024)
    }
}

/// First process whose name matches.
pub fn locate_main(table: &mut dyn ProcessTable, name: &NameMatch) -> Result<ProcessHandle> {
    let found = table.processes().into_iter().find(|p| name.matches(&p.name));
    match found {
        Some(p) => {
            log::debug!("main server process: pid={} name={}", p.pid, p.name);
            Ok(p)
        }
        None => Err(Error::ProcessNotFound {
            name: name.pattern().to_string(),
        }),
    }
}

/// First matching process other than `main`. Only exists while an attachment is open.
pub fn locate_worker(
    table: &mut dyn ProcessTable,
    name: &NameMatch,
    main: &ProcessHandle,
) -> Result<ProcessHandle> {
    let found = table
        .processes()
        .into_iter()
        .find(|p| p.pid != main.pid && name.matches(&p.name));
    match found {
        Some(p) => {
            log::debug!("attachment process: pid={} name={}", p.pid, p.name);
            Ok(p)
        }
        None => Err(Error::WorkerNotFound {
            name: name.pattern().to_string(),
            main_pid: main.pid,
        }),
    }
}

/// How the run finds the process to sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTarget {
    pub name: NameMatch,
    pub topology: Topology,
    /// Proceed with tracking disabled when the server cannot be found
    /// (e.g. it runs under valgrind and carries a different name).
    pub allow_missing: bool,
}

impl ProcessTarget {
    /// Called before the workload opens its connection.
    pub fn find_main(&self, table: &mut dyn ProcessTable) -> Result<Option<ProcessHandle>> {
        match locate_main(table, &self.name) {
            Ok(p) => Ok(Some(p)),
            Err(err @ Error::ProcessNotFound { .. }) => {
                if self.allow_missing {
                    log::warn!("{err}; maybe it runs under valgrind? memory tracking disabled");
                    Ok(None)
                } else {
                    Err(err)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Called after the workload's connection is open.
    pub fn resolve(
        &self,
        table: &mut dyn ProcessTable,
        main: Option<ProcessHandle>,
    ) -> Result<Option<ProcessHandle>> {
        let Some(main) = main else {
            return Ok(None);
        };
        match self.topology {
            Topology::SingleProcess => Ok(Some(main)),
            Topology::SeparateWorker => locate_worker(table, &self.name, &main).map(Some),
        }
    }
}
