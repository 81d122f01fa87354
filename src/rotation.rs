//! Log file naming and retention
//!
//! A [`LogRotator`] owns a log directory and a retention count. Each time a
//! process is about to start, the rotator prunes that process's old log
//! files down to `retain - 1` survivors and hands back a fresh path for the
//! new one. The rotator only names the file; opening it is the caller's job.

use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Chooses log file paths and prunes old logs beyond a retention count
#[derive(Debug, Clone)]
pub struct LogRotator {
    /// Directory receiving the log files
    dir: PathBuf,

    /// Maximum number of log files kept per base name
    retain: usize,

    /// Last path handed out, so consecutive requests never collide
    last_issued: Option<PathBuf>,
}

impl LogRotator {
    /// Create a rotator for `dir` keeping at most `retain` files per process
    pub fn new<P: Into<PathBuf>>(dir: P, retain: usize) -> Self {
        Self {
            dir: dir.into(),
            retain: retain.max(1),
            last_issued: None,
        }
    }

    /// The directory this rotator manages
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of log files kept per base name
    pub fn retain(&self) -> usize {
        self.retain
    }

    /// Prune old logs for `name` and return a fresh, non-colliding path.
    ///
    /// Pruning failures are logged and never block the caller; in the worst
    /// case old logs accumulate until a later rotation succeeds.
    pub fn next_log_path(&mut self, name: &str) -> PathBuf {
        let base = sanitize_base_name(name);

        if let Err(e) = self.prune(&base) {
            warn!("Log rotation for {} failed: {}", name, e);
        }

        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let mut candidate = self.dir.join(format!("{}.{}.log", base, stamp));
        let mut suffix = 1;
        while candidate.exists() || self.last_issued.as_ref() == Some(&candidate) {
            candidate = self.dir.join(format!("{}.{}-{}.log", base, stamp, suffix));
            suffix += 1;
        }

        self.last_issued = Some(candidate.clone());
        candidate
    }

    /// Delete the oldest logs for `base`, leaving room for one new file
    fn prune(&self, base: &str) -> io::Result<()> {
        let mut logs = self.existing_logs(base)?;
        let keep = self.retain - 1;
        if logs.len() <= keep {
            return Ok(());
        }

        let excess = logs.len() - keep;
        for (_, path) in logs.drain(..excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Pruned old log {}", path.display()),
                Err(e) => warn!("Could not delete old log {}: {}", path.display(), e),
            }
        }

        Ok(())
    }

    /// Logs for `base` in this directory, oldest first.
    ///
    /// Sorted by (mtime, path) so ordering stays deterministic when several
    /// files share a modification time.
    fn existing_logs(&self, base: &str) -> io::Result<Vec<(SystemTime, PathBuf)>> {
        let prefix = format!("{}.", base);
        let mut logs = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".log") {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            logs.push((modified, entry.path()));
        }

        logs.sort();
        Ok(logs)
    }
}

/// Derive a filesystem-safe base name from a process display name
pub fn sanitize_base_name(name: &str) -> String {
    let base: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if base.is_empty() {
        "process".to_string()
    } else {
        base
    }
}
