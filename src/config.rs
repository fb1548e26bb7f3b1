//! Configuration for [`HitCounter`](crate::HitCounter).

use std::path::PathBuf;
use std::time::Duration;

/// Default delay between the first change in an idle period and the save.
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(10);

/// Default snapshot file name prefix.
pub const DEFAULT_FILE_PREFIX: &str = "hit";

/// Default snapshot file name suffix.
pub const DEFAULT_FILE_SUFFIX: &str = ".json";

/// Configuration for the counter and its snapshot store.
///
/// # Examples
///
/// ```rust
/// use pagehits::HitCounterConfig;
/// use std::time::Duration;
///
/// let config = HitCounterConfig::new()
///     .data_dir("/var/lib/pagehits")
///     .save_interval(Duration::from_secs(30));
///
/// assert_eq!(config.save_interval, Duration::from_secs(30));
/// assert_eq!(config.file_suffix, ".json");
/// ```
#[derive(Debug, Clone)]
pub struct HitCounterConfig {
    /// Directory holding the snapshot files.
    pub data_dir: PathBuf,
    /// Throttle interval between the first dirty event and the save.
    pub save_interval: Duration,
    /// Snapshot file name prefix.
    pub file_prefix: String,
    /// Snapshot file name suffix, used to filter directory listings.
    pub file_suffix: String,
    /// Whether to pretty-print snapshot files.
    pub pretty: bool,
}

impl Default for HitCounterConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            save_interval: DEFAULT_SAVE_INTERVAL,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            pretty: false,
        }
    }
}

impl HitCounterConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the throttle interval.
    pub fn save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    /// Sets the snapshot file name prefix.
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Sets the snapshot file name suffix.
    pub fn file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// Enables or disables pretty-printed snapshot files.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = HitCounterConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.save_interval, Duration::from_secs(10));
        assert_eq!(config.file_prefix, "hit");
        assert_eq!(config.file_suffix, ".json");
        assert!(!config.pretty);
    }

    #[test]
    fn test_builder() {
        let config = HitCounterConfig::new()
            .data_dir("/tmp/hits")
            .save_interval(Duration::from_millis(250))
            .file_prefix("snap")
            .file_suffix(".snap")
            .pretty(true);

        assert_eq!(config.data_dir, PathBuf::from("/tmp/hits"));
        assert_eq!(config.save_interval, Duration::from_millis(250));
        assert_eq!(config.file_prefix, "snap");
        assert_eq!(config.file_suffix, ".snap");
        assert!(config.pretty);
    }
}
