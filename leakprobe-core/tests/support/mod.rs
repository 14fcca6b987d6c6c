#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use leakprobe_core::{Connection, Connector, DbError, ProcessHandle, ProcessTable, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CreateDatabase(PathBuf),
    Connect(PathBuf),
    Execute(String),
    Commit,
    Close,
    Dropped,
}

/// Shared between a [`FakeConnector`], its connections and a [`FakeProcesses`].
#[derive(Debug, Default)]
pub struct World {
    pub events: Vec<Event>,
    /// Statement text -> error message returned by the "server".
    pub failures: BTreeMap<String, String>,
    pub procs: Vec<ProcessHandle>,
    /// Spawned on every attach, removed on close, like a classic-server worker.
    pub worker: Option<ProcessHandle>,
    pub rss: BTreeMap<u32, VecDeque<u64>>,
    pub rss_reads: usize,
    /// Create the database file on disk when "creating" a database.
    pub touch_files: bool,
}

pub type Shared = Rc<RefCell<World>>;

pub fn world() -> Shared {
    Rc::new(RefCell::new(World::default()))
}

pub fn firebird(pid: u32) -> ProcessHandle {
    ProcessHandle {
        pid,
        name: "firebird".to_string(),
    }
}

impl World {
    pub fn executed(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Execute(sql) => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn count_sql(&self, sql: &str) -> usize {
        self.executed().iter().filter(|s| **s == sql).count()
    }

    fn attach(&mut self) {
        if let Some(worker) = self.worker.clone()
            && !self.procs.iter().any(|p| p.pid == worker.pid)
        {
            self.procs.push(worker);
        }
    }

    fn detach(&mut self) {
        if let Some(worker) = &self.worker {
            let pid = worker.pid;
            self.procs.retain(|p| p.pid != pid);
        }
    }
}

pub struct FakeConnector {
    pub world: Shared,
}

impl Connector for FakeConnector {
    fn create_database(&self, path: &Path) -> Result<Box<dyn Connection>, DbError> {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::CreateDatabase(path.to_path_buf()));
        if w.touch_files {
            std::fs::write(path, b"fake").map_err(|e| DbError::new(e.to_string()))?;
        }
        w.attach();
        Ok(Box::new(FakeConnection {
            world: self.world.clone(),
            closed: false,
        }))
    }

    fn connect(&self, path: &Path) -> Result<Box<dyn Connection>, DbError> {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::Connect(path.to_path_buf()));
        w.attach();
        Ok(Box::new(FakeConnection {
            world: self.world.clone(),
            closed: false,
        }))
    }
}

pub struct FakeConnection {
    world: Shared,
    closed: bool,
}

impl Connection for FakeConnection {
    fn execute(&mut self, stmt: &Statement) -> Result<(), DbError> {
        let mut w = self.world.borrow_mut();
        w.events.push(Event::Execute(stmt.sql().to_string()));
        match w.failures.get(stmt.sql()) {
            Some(msg) => Err(DbError::new(msg.clone())),
            None => Ok(()),
        }
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.world.borrow_mut().events.push(Event::Commit);
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<(), DbError> {
        self.closed = true;
        let mut w = self.world.borrow_mut();
        w.events.push(Event::Close);
        w.detach();
        Ok(())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        if !self.closed {
            let mut w = self.world.borrow_mut();
            w.events.push(Event::Dropped);
            w.detach();
        }
    }
}

pub struct FakeProcesses {
    pub world: Shared,
}

impl ProcessTable for FakeProcesses {
    fn processes(&mut self) -> Vec<ProcessHandle> {
        let mut out = self.world.borrow().procs.clone();
        out.sort_by_key(|p| p.pid);
        out
    }

    fn rss_kb(&mut self, pid: u32) -> Option<u64> {
        let mut w = self.world.borrow_mut();
        w.rss_reads += 1;
        if !w.procs.iter().any(|p| p.pid == pid) {
            return None;
        }
        let queue = w.rss.get_mut(&pid)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        }
    }
}
