use jdorm::driver::{Capability, Driver};
use jdorm_driver_sqlite::Sqlite;

use crate::Setup;

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// A file-backed database unique to one test. In-memory databases cannot be
/// shared between pooled connections, so every test gets its own file.
pub struct SetupSqlite {
    path: PathBuf,
}

impl SetupSqlite {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "jdorm-test-{}-{}.db",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));

        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

impl Default for SetupSqlite {
    fn default() -> Self {
        Self::new()
    }
}

impl Setup for SetupSqlite {
    fn driver(&self) -> Box<dyn Driver> {
        Box::new(Sqlite::open(&self.path))
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }
}

impl Drop for SetupSqlite {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}
