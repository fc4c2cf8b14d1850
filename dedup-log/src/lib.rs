//! Append-only, newline-delimited logs of item identifiers that have already
//! received a reply.
//!
//! A log only ever grows. Appends go through `O_APPEND` and are synced before
//! returning, so two processes sharing a file will not interleave partial
//! lines, though a reader may miss an append that lands after its read.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use wonderbot_core::{Category, DedupLogError};

#[derive(Debug, Clone)]
pub struct DedupLog {
    path: PathBuf,
}

impl DedupLog {
    /// Prepares a log at `path`, creating its parent directory if needed.
    /// The file itself is created by the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DedupLogError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| DedupLogError::CreateDirFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable logs count as empty.
    pub fn contains(&self, id: &str) -> bool {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Dedup log {} does not exist yet", self.path.display());
                return false;
            }
            Err(e) => {
                warn!(
                    "Could not read dedup log {}, treating it as empty: {}",
                    self.path.display(),
                    e
                );
                return false;
            }
        };

        contents.lines().any(|line| !line.is_empty() && line == id)
    }

    pub fn append(&self, id: &str) -> Result<(), DedupLogError> {
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(DedupLogError::InvalidId { id: id.to_string() });
        }

        let append_failed = |source| DedupLogError::AppendFailed {
            id: id.to_string(),
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_failed)?;

        // One write call per line keeps concurrent appends line-atomic.
        file.write_all(format!("{}\n", id).as_bytes())
            .map_err(append_failed)?;
        file.sync_data().map_err(append_failed)?;

        debug!("Recorded {} in {}", id, self.path.display());
        Ok(())
    }
}

/// The comment log and the submission log, side by side in one directory.
#[derive(Debug, Clone)]
pub struct DedupLogs {
    comments: DedupLog,
    submissions: DedupLog,
}

impl DedupLogs {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, DedupLogError> {
        let dir = dir.as_ref();
        Ok(Self {
            comments: DedupLog::open(dir.join(Category::Comment.log_file_name()))?,
            submissions: DedupLog::open(dir.join(Category::Submission.log_file_name()))?,
        })
    }

    pub fn for_category(&self, category: Category) -> &DedupLog {
        match category {
            Category::Comment => &self.comments,
            Category::Submission => &self.submissions,
        }
    }
}
