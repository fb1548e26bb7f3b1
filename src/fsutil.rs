//! Filesystem primitives used by the snapshot store.
//!
//! Every function in this module is infallible from the caller's point of
//! view: access errors collapse into default values (`false`, empty vectors,
//! `None`) and are reported through `tracing` where they matter.
//!
//! # Examples
//!
//! ```rust,ignore
//! use pagehits::fsutil;
//!
//! let dir = fsutil::ensure_directory("./data").await.expect("unusable");
//! for file in fsutil::list_directory(&dir.path, ".json").await {
//!     println!("{}", file.path.display());
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;
use tracing::{debug, warn};

/// Information about a file or directory.
///
/// All flags default to `false` and `modified` to the Unix epoch when the
/// path cannot be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// The probed path.
    pub path: PathBuf,
    /// The path exists.
    pub exists: bool,
    /// The path can be opened for reading (listed, for directories).
    pub readable: bool,
    /// This process may write to the path (create entries, for directories).
    pub writable: bool,
    /// The path is a regular file.
    pub is_file: bool,
    /// The path is a directory.
    pub is_dir: bool,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileInfo {
    fn missing(path: PathBuf) -> Self {
        Self {
            path,
            exists: false,
            readable: false,
            writable: false,
            is_file: false,
            is_dir: false,
            modified: SystemTime::UNIX_EPOCH,
        }
    }
}

/// Returns information about a file or directory.
///
/// Never fails: a path that cannot be inspected is reported with all flags
/// cleared.
pub async fn probe(path: impl AsRef<Path>) -> FileInfo {
    let path = path.as_ref();
    let mut info = FileInfo::missing(path.to_path_buf());

    let Ok(meta) = fs::metadata(path).await else {
        return info;
    };

    info.exists = true;
    info.is_file = meta.is_file();
    info.is_dir = meta.is_dir();
    info.modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    (info.readable, info.writable) = permissions(path, &meta).await;

    info
}

/// Checks read and write access for the calling process.
#[cfg(unix)]
async fn permissions(path: &Path, meta: &std::fs::Metadata) -> (bool, bool) {
    use rustix::fs::Access;

    // Directories must also be searchable to be listed or written into.
    let search = if meta.is_dir() {
        Access::EXEC_OK
    } else {
        Access::empty()
    };
    (
        access(path, Access::READ_OK | search).await,
        access(path, Access::WRITE_OK | search).await,
    )
}

#[cfg(not(unix))]
async fn permissions(path: &Path, meta: &std::fs::Metadata) -> (bool, bool) {
    let readable = if meta.is_dir() {
        fs::read_dir(path).await.is_ok()
    } else {
        fs::File::open(path).await.is_ok()
    };
    (readable, !meta.permissions().readonly())
}

#[cfg(unix)]
async fn access(path: &Path, mode: rustix::fs::Access) -> bool {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || rustix::fs::access(path.as_path(), mode).is_ok())
        .await
        .unwrap_or(false)
}

/// Returns the directory information if `path` is a usable directory.
///
/// The directory is created (recursively) when it does not exist yet. The
/// result is `None` unless the directory exists and is both readable and
/// writable afterwards.
pub async fn ensure_directory(path: impl AsRef<Path>) -> Option<FileInfo> {
    let path = path.as_ref();
    let mut info = probe(path).await;

    if !info.is_dir {
        if let Err(err) = fs::create_dir_all(path).await {
            warn!(path = %path.display(), error = %err, "cannot create directory");
            return None;
        }
        info = probe(path).await;
    }

    (info.is_dir && info.readable && info.writable).then_some(info)
}

/// Lists the readable regular files in `dir` whose name ends with `suffix`.
///
/// The result is sorted by modification time, most recent first. A missing
/// or unreadable directory yields an empty list.
pub async fn list_directory(dir: impl AsRef<Path>, suffix: &str) -> Vec<FileInfo> {
    let dir = dir.as_ref();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %dir.display(), error = %err, "cannot list directory");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let name = entry.file_name();
                if !name.to_string_lossy().ends_with(suffix) {
                    continue;
                }
                let info = probe(entry.path()).await;
                if info.is_file && info.readable {
                    files.push(info);
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "directory listing interrupted");
                break;
            }
        }
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    files
}

/// Writes `content` to `path`, replacing any existing file.
///
/// Returns `true` on success.
pub async fn write_file(path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> bool {
    let path = path.as_ref();
    match fs::write(path, content).await {
        Ok(()) => true,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "write error");
            false
        }
    }
}

/// Deletes every path, returning one success flag per path.
///
/// A failure on one path does not stop the remaining deletions.
pub async fn delete_files<P: AsRef<Path>>(paths: &[P]) -> Vec<bool> {
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path).await {
            Ok(()) => results.push(true),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unlink error");
                results.push(false);
            }
        }
    }
    results
}
