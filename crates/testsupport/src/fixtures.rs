//! Fixture workspaces for tests that need real CSV files on disk.
//!
//! Every table name csvql resolves (`people`, `people.csv`, an index
//! file, a `.sql` view) is looked up relative to the process's current
//! directory — there is no configurable data directory (spec §9's "pass
//! explicit parameters, no hidden singletons" stops at the RNG seed and
//! program name). A test therefore needs its own directory and its own
//! turn at being the process's cwd, which is why [`Workspace`] takes a
//! process-wide lock for as long as it's alive.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use tempfile::TempDir;

fn cwd_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// A temporary directory seeded with fixture files, `chdir`'d into for
/// the lifetime of the guard. Restores the previous directory on drop.
pub struct Workspace {
    dir: TempDir,
    previous: PathBuf,
    _guard: MutexGuard<'static, ()>,
}

impl Workspace {
    /// Creates an empty fixture directory and makes it the process's cwd.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Creates a fixture directory containing `files` (name → contents,
    /// written verbatim — callers supply their own trailing newlines) and
    /// makes it the process's cwd.
    pub fn new(files: &[(&str, &str)]) -> Self {
        let guard = cwd_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let dir = TempDir::new().expect("creating fixture tempdir");
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents)
                .unwrap_or_else(|e| panic!("writing fixture file '{name}': {e}"));
        }
        let previous = env::current_dir().expect("reading current directory");
        env::set_current_dir(dir.path()).expect("entering fixture directory");
        Self { dir, previous, _guard: guard }
    }

    /// The fixture directory's path, for tests that need to write
    /// additional files (e.g. an index file) after construction.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes (or overwrites) one more file into the fixture directory.
    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.dir.path().join(name), contents)
            .unwrap_or_else(|e| panic!("writing fixture file '{name}': {e}"));
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}

/// `people.csv` from spec §8's end-to-end scenarios.
pub const PEOPLE_CSV: &str = "id,name,score\n1,Alice,10\n2,Bob,20\n3,Cara,20\n4,Dan,5\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chdir_round_trips_through_drop() {
        let before = env::current_dir().unwrap();
        {
            let ws = Workspace::new(&[("people.csv", PEOPLE_CSV)]);
            assert_eq!(env::current_dir().unwrap(), ws.path());
            assert!(Path::new("people.csv").is_file());
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }
}
