//! File-backed session output.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local};

use super::{lock_recovered, TraceSession};
use crate::tree::CallTree;
use crate::Result;

/// Session that writes each emitted tree to its own timestamped file under
/// a fixed directory, named `<timestamp>_<trace_id>.txt`.
pub struct FileSession {
    dir: PathBuf,
    messages: Mutex<Vec<String>>,
    emissions: AtomicUsize,
    terminated: AtomicBool,
}

impl FileSession {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            messages: Mutex::new(Vec::new()),
            emissions: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn messages(&self) -> Vec<String> {
        lock_recovered(&self.messages).clone()
    }

    fn file_path(&self, tree: &CallTree) -> PathBuf {
        let datetime: DateTime<Local> = tree.started_at().into();
        self.dir.join(format!(
            "{}_{}.txt",
            datetime.format("%Y-%m-%d_%H-%M-%S"),
            tree.trace_id()
        ))
    }
}

impl TraceSession for FileSession {
    fn write(&self, tree: &CallTree) -> Result<()> {
        fs::write(self.file_path(tree), tree.render())?;
        Ok(())
    }

    fn emission_count(&self) -> usize {
        self.emissions.load(Ordering::SeqCst)
    }

    fn record_emission(&self) -> usize {
        self.emissions.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn abort(&self, limit: usize) {
        lock_recovered(&self.messages).push(format!(
            "Emission limit of {limit} reached, tracing aborted"
        ));
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn fail(&self, message: &str) {
        lock_recovered(&self.messages).push(message.to_string());
        self.terminated.store(true, Ordering::SeqCst);
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FrameKind;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_one_file_per_tree() {
        let dir = tempdir().unwrap();
        let session = FileSession::new(dir.path().join("traces")).unwrap();

        let mut tree = CallTree::new();
        tree.begin("Demo:run()", FrameKind::Invoke);
        tree.end_with_cost(2.5);
        session.write(&tree).unwrap();

        let files: Vec<_> = fs::read_dir(session.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 1);

        let name = files[0].file_name().to_string_lossy().to_string();
        assert!(name.contains(tree.trace_id()));

        let content = fs::read_to_string(files[0].path()).unwrap();
        assert!(content.contains("Demo:run()"));
    }

    #[test]
    fn test_counter_and_terminal_flags() {
        let dir = tempdir().unwrap();
        let session = FileSession::new(dir.path()).unwrap();

        assert_eq!(session.record_emission(), 1);
        assert_eq!(session.emission_count(), 1);
        assert!(!session.is_terminated());

        session.abort(5);
        assert!(session.is_terminated());
        assert!(session.messages()[0].contains("limit of 5"));
    }
}
