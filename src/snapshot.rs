//! Snapshot types for serializing counter state.
//!
//! A snapshot is a point-in-time copy of every key and its count. On disk
//! it is a single JSON object mapping each key to its count:
//!
//! ```text
//! {"3f2a9c":12,"a81b04":1}
//! ```
//!
//! Snapshot files are named `{prefix}{generation}{suffix}`, where the
//! generation is a millisecond timestamp that only ever grows.
//!
//! # Examples
//!
//! ```rust
//! use pagehits::snapshot::CountSnapshot;
//!
//! let snapshot = CountSnapshot::from_json(r#"{ "a": 7, "b": 1 }"#).unwrap();
//! assert_eq!(snapshot.get("a"), Some(7));
//! assert_eq!(snapshot.to_json(false).unwrap(), r#"{"a":7,"b":1}"#);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::fsutil::FileInfo;

/// A serializable copy of the counter state.
///
/// Keys are kept ordered so that two snapshots of the same state serialize
/// to identical bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CountSnapshot {
    counts: BTreeMap<String, u64>,
}

impl CountSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count stored for `key`.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if the snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(key, count)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Parses a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the snapshot to JSON, optionally pretty-printed.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for CountSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for CountSnapshot {
    type Item = (String, u64);
    type IntoIter = std::collections::btree_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

/// A snapshot file on storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
    /// Generation marker parsed from the file name, if it has one.
    pub generation: Option<u64>,
}

impl SnapshotFile {
    /// Builds a descriptor from probed file information.
    pub fn from_info(info: FileInfo, prefix: &str, suffix: &str) -> Self {
        let generation = parse_generation(&info.path, prefix, suffix);
        Self {
            path: info.path,
            modified: info.modified,
            generation,
        }
    }
}

/// Returns the file name for a snapshot of the given generation.
pub fn file_name(prefix: &str, generation: u64, suffix: &str) -> String {
    format!("{prefix}{generation}{suffix}")
}

/// Extracts the generation marker from a snapshot file name.
///
/// Returns `None` when the name does not have the `{prefix}{digits}{suffix}`
/// shape.
pub fn parse_generation(path: &Path, prefix: &str, suffix: &str) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let digits = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Orders snapshot files most recent first.
///
/// Modification time decides; equal times fall back to the generation
/// marker, so files written within the same clock tick still sort in
/// creation order.
pub fn sort_most_recent_first(files: &mut [SnapshotFile]) {
    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.generation.cmp(&a.generation))
    });
}

/// Returns the current timestamp in milliseconds since Unix epoch.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
