//! Configuration helpers. Contains [PackageConfig] (raw, as provided by the
//! user) and [validate] turning it into [ValidatedConfig], used for the rest
//! of packaging run.

use chrono::TimeDelta;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::{
    fmt,
    path::{Path, PathBuf},
};
use url::Url;

/// Which point in time is used as `Last-Modified` of packaged files.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TimestampSource {
    /// Modification time of each file, read from fs.
    FileModified,
    /// Time of packaging run, shared by all files.
    #[default]
    PackagingTime,
}

/// Raw packaging configuration, usually filled from command line.
///
/// Nothing here is checked until passed to [validate].
///
/// If not sure what to set here, use [Default] and fill the required fields.
#[derive(Clone, Debug)]
pub struct PackageConfig {
    /// Directory containing resources to be packaged.
    pub folder: Option<PathBuf>,
    /// Base url the resources are served under, eg. `http://www.foo.bar`.
    /// Trailing `/` is ignored.
    pub base_url: Option<String>,
    /// Seconds added to `Last-Modified` to calculate `Expires`. Zero is allowed
    /// and means "immediately stale".
    pub max_age: Option<u64>,
    /// Path of the archive to be created.
    pub output_path: Option<PathBuf>,

    /// Include hidden files (with name or any parent directory starting with
    /// `.`).
    pub include_all: bool,
    /// Files larger than this (in bytes) are skipped.
    pub max_item_file_size: Option<u64>,
    /// Glob patterns, files with relative path matching any of them are
    /// skipped.
    pub exclude_patterns: Vec<String>,
    /// Append mime type to each manifest record.
    pub mime_types: bool,

    /// Source of `Last-Modified` timestamp.
    pub timestamp_source: TimestampSource,
    /// Seconds added to `Last-Modified`. Cannot be combined with
    /// [Self::last_modified_minus].
    pub last_modified_plus: Option<u64>,
    /// Seconds subtracted from `Last-Modified`. Cannot be combined with
    /// [Self::last_modified_plus].
    pub last_modified_minus: Option<u64>,

    /// Whether to follow links while traversing directories. When disabled,
    /// links are skipped and reported.
    pub follow_links: bool,
    /// Visit directory entries sorted by name, producing reproducible entry
    /// order.
    pub sort_entries: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            folder: None,
            base_url: None,
            max_age: None,
            output_path: None,
            include_all: false,
            max_item_file_size: None,
            exclude_patterns: Vec::new(),
            mime_types: false,
            timestamp_source: TimestampSource::default(),
            last_modified_plus: None,
            last_modified_minus: None,
            follow_links: true,
            sort_entries: false,
        }
    }
}

/// Single configuration problem found by [validate].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Source folder not set.
    #[error("import folder (--folder) is missing")]
    FolderMissing,
    /// Source folder set, but not a directory.
    #[error("import folder {0:?} does not exist or is not a directory")]
    FolderNotDirectory(PathBuf),
    /// Output path not set.
    #[error("output file (--outfile) is missing")]
    OutputMissing,
    /// Max age not set.
    #[error("max age (--maxage) is missing")]
    MaxAgeMissing,
    /// Max age does not fit in a timestamp.
    #[error("max age of {0} seconds is out of range")]
    MaxAgeOutOfRange(u64),
    /// Base url not set.
    #[error("base url (--baseurl) is missing")]
    BaseUrlMissing,
    /// Base url cannot be parsed.
    #[error("base url {url:?} is invalid: {reason}")]
    BaseUrlInvalid {
        /// Url as provided.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// Base url parsed, but contains no hostname.
    #[error("base url {0:?} has no hostname")]
    BaseUrlWithoutHost(String),
    /// Exclude pattern is not a valid glob.
    #[error("exclude pattern {pattern:?} is invalid: {reason}")]
    ExcludePatternInvalid {
        /// Pattern as provided.
        pattern: String,
        /// Glob parser message.
        reason: String,
    },
    /// Exclude patterns are valid, but the combined matcher failed to build.
    #[error("exclude patterns cannot be combined: {0}")]
    ExcludePatternSet(String),
    /// Both plus and minus offsets set.
    #[error("last modified plus and minus offsets cannot be used together")]
    OffsetConflict,
    /// Offset does not fit in a timestamp.
    #[error("last modified offset of {0} seconds is out of range")]
    OffsetOutOfRange(u64),
}

/// Non-empty list of [ConfigError], all problems found in a [PackageConfig].
#[derive(Debug, PartialEq, Eq)]
pub struct ConfigErrors(Vec<ConfigError>);
impl ConfigErrors {
    /// Returns all collected errors, in order of checks.
    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }
}
impl fmt::Display for ConfigErrors {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", itertools::join(&self.0, "\n"))
    }
}
impl std::error::Error for ConfigErrors {}

/// Checked configuration, created with [validate]. Immutable.
#[derive(Debug)]
pub struct ValidatedConfig {
    pub(crate) folder: PathBuf,
    pub(crate) base_url: String,
    pub(crate) hostname: String,
    pub(crate) max_age: TimeDelta,
    pub(crate) output_path: PathBuf,

    pub(crate) include_all: bool,
    pub(crate) max_item_file_size: Option<u64>,
    pub(crate) exclude_patterns: Vec<String>,
    pub(crate) exclude_set: GlobSet,
    pub(crate) mime_types: bool,

    pub(crate) timestamp_source: TimestampSource,
    pub(crate) timestamp_offset: TimeDelta,

    pub(crate) follow_links: bool,
    pub(crate) sort_entries: bool,
}
impl ValidatedConfig {
    /// Source directory.
    pub fn folder(&self) -> &Path {
        &self.folder
    }
    /// Base url, without trailing `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
    /// Hostname derived from base url, top level directory of the archive.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
    /// Output archive path.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
    /// Max age as duration.
    pub fn max_age(&self) -> TimeDelta {
        self.max_age
    }
    /// Signed offset applied to every base timestamp.
    pub fn timestamp_offset(&self) -> TimeDelta {
        self.timestamp_offset
    }
}

/// Checks `config`, collecting every problem found.
///
/// All checks are run, so the returned [ConfigErrors] lists all issues at
/// once. The only I/O performed is checking whether the source folder exists.
///
/// # Examples
///
/// ```
/// # use afcache_packer::config::{validate, ConfigError, PackageConfig};
/// let errors = validate(PackageConfig {
///     base_url: Some("http://example.com/".to_owned()),
///     ..PackageConfig::default()
/// })
/// .unwrap_err();
///
/// assert_eq!(
///     errors.errors(),
///     &[
///         ConfigError::FolderMissing,
///         ConfigError::OutputMissing,
///         ConfigError::MaxAgeMissing,
///     ]
/// );
/// ```
pub fn validate(config: PackageConfig) -> Result<ValidatedConfig, ConfigErrors> {
    let mut errors = Vec::<ConfigError>::new();

    let folder = match config.folder {
        None => {
            errors.push(ConfigError::FolderMissing);
            None
        }
        Some(folder) if folder.as_os_str().is_empty() => {
            errors.push(ConfigError::FolderMissing);
            None
        }
        Some(folder) if !folder.is_dir() => {
            errors.push(ConfigError::FolderNotDirectory(folder));
            None
        }
        Some(folder) => Some(folder),
    };

    let output_path = match config.output_path {
        Some(output_path) if !output_path.as_os_str().is_empty() => Some(output_path),
        _ => {
            errors.push(ConfigError::OutputMissing);
            None
        }
    };

    let max_age = match config.max_age {
        None => {
            errors.push(ConfigError::MaxAgeMissing);
            None
        }
        Some(max_age) => {
            let delta = seconds(max_age);
            if delta.is_none() {
                errors.push(ConfigError::MaxAgeOutOfRange(max_age));
            }
            delta
        }
    };

    let base_url_hostname = match config.base_url.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(ConfigError::BaseUrlMissing);
            None
        }
        Some(base_url) => match hostname_from_base_url(base_url) {
            Ok(hostname) => Some((base_url.trim_end_matches('/').to_owned(), hostname)),
            Err(error) => {
                errors.push(error);
                None
            }
        },
    };

    let exclude_set = match exclude_set_from_patterns(&config.exclude_patterns) {
        Ok(exclude_set) => Some(exclude_set),
        Err(mut exclude_errors) => {
            errors.append(&mut exclude_errors);
            None
        }
    };

    let timestamp_offset = match timestamp_offset(
        config.last_modified_plus,
        config.last_modified_minus,
    ) {
        Ok(timestamp_offset) => Some(timestamp_offset),
        Err(error) => {
            errors.push(error);
            None
        }
    };

    match (
        folder,
        output_path,
        max_age,
        base_url_hostname,
        exclude_set,
        timestamp_offset,
    ) {
        (
            Some(folder),
            Some(output_path),
            Some(max_age),
            Some((base_url, hostname)),
            Some(exclude_set),
            Some(timestamp_offset),
        ) if errors.is_empty() => Ok(ValidatedConfig {
            folder,
            base_url,
            hostname,
            max_age,
            output_path,
            include_all: config.include_all,
            max_item_file_size: config.max_item_file_size,
            exclude_patterns: config.exclude_patterns,
            exclude_set,
            mime_types: config.mime_types,
            timestamp_source: config.timestamp_source,
            timestamp_offset,
            follow_links: config.follow_links,
            sort_entries: config.sort_entries,
        }),
        _ => Err(ConfigErrors(errors)),
    }
}

/// Extracts hostname (authority without port and credentials) from base url.
fn hostname_from_base_url(base_url: &str) -> Result<String, ConfigError> {
    let url = Url::parse(base_url).map_err(|error| ConfigError::BaseUrlInvalid {
        url: base_url.to_owned(),
        reason: error.to_string(),
    })?;

    match url.host_str() {
        Some(hostname) if !hostname.is_empty() => Ok(hostname.to_owned()),
        _ => Err(ConfigError::BaseUrlWithoutHost(base_url.to_owned())),
    }
}

/// Compiles all exclude patterns into single matcher. Pattern indices in the
/// set are the same as in `patterns`.
fn exclude_set_from_patterns(patterns: &[String]) -> Result<GlobSet, Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(error) => errors.push(ConfigError::ExcludePatternInvalid {
                pattern: pattern.clone(),
                reason: error.to_string(),
            }),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    builder
        .build()
        .map_err(|error| vec![ConfigError::ExcludePatternSet(error.to_string())])
}

/// Combines plus / minus offsets into single signed offset. Zero counts as
/// not set.
fn timestamp_offset(
    plus: Option<u64>,
    minus: Option<u64>,
) -> Result<TimeDelta, ConfigError> {
    let plus = plus.filter(|plus| *plus != 0);
    let minus = minus.filter(|minus| *minus != 0);

    match (plus, minus) {
        (Some(_), Some(_)) => Err(ConfigError::OffsetConflict),
        (Some(plus), None) => seconds(plus).ok_or(ConfigError::OffsetOutOfRange(plus)),
        (None, Some(minus)) => seconds(minus)
            .map(|minus| -minus)
            .ok_or(ConfigError::OffsetOutOfRange(minus)),
        (None, None) => Ok(TimeDelta::zero()),
    }
}

fn seconds(value: u64) -> Option<TimeDelta> {
    i64::try_from(value).ok().and_then(TimeDelta::try_seconds)
}
