//! Directory helpers. Contains [Walker], a lazy iterator over files eligible
//! for packaging, found by recursively traversing the source folder.

use crate::{
    config::ValidatedConfig,
    export_path,
    report::{Event, Reporter, SkipReason},
};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

/// Error returned while traversing the source folder.
#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    /// Directory could not be read.
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    /// File metadata could not be read.
    #[error("cannot read metadata of {path:?}")]
    Metadata {
        /// Offending file.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
}

/// Regular file found in the source folder.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FileEntry {
    /// Path of the file, as seen during traversal (source folder joined with
    /// relative path).
    pub path: PathBuf,
    /// Path relative to the source folder.
    pub relative_path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Modification time.
    pub modified: SystemTime,
}

/// Depth-first iterator over [FileEntry] in the source folder.
///
/// Files are filtered as they are found, in following order, first matching
/// rule skips the file and is reported as [Event::Skipped]:
/// 1. hidden files (name or parent directory starting with `.`), unless
///    `include_all` is set,
/// 2. links, unless `follow_links` is set, and links that cannot be resolved
///    otherwise,
/// 3. files with relative path not being valid unicode,
/// 4. files larger than `max_item_file_size`, if set,
/// 5. files matching any exclude pattern, if set.
///
/// Directories are never yielded, so empty directories leave no trace.
pub struct Walker<'a> {
    inner: walkdir::IntoIter,
    config: &'a ValidatedConfig,
    reporter: &'a dyn Reporter,
    ignored: Vec<PathBuf>,
    skipped: usize,
}
impl<'a> Walker<'a> {
    /// Starts traversal of `config` source folder.
    pub fn new(
        config: &'a ValidatedConfig,
        reporter: &'a dyn Reporter,
    ) -> Self {
        let mut walk_dir = WalkDir::new(&config.folder).follow_links(config.follow_links);
        if config.sort_entries {
            walk_dir = walk_dir.sort_by_file_name();
        }

        Self {
            inner: walk_dir.into_iter(),
            config,
            reporter,
            ignored: Vec::new(),
            skipped: 0,
        }
    }

    /// Silently leaves out `path` if found during traversal. Used to keep the
    /// archive being written out of itself, when output directory is inside
    /// the source folder.
    pub fn ignore(
        mut self,
        path: &Path,
    ) -> Self {
        if let Some(path) = canonical_target(path) {
            self.ignored.push(path);
        }
        self
    }

    /// Number of files skipped by filtering rules so far.
    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    fn is_ignored(
        &self,
        path: &Path,
    ) -> bool {
        // canonicalize only candidates with matching name
        self.ignored.iter().any(|ignored| {
            ignored.file_name() == path.file_name()
                && fs::canonicalize(path).is_ok_and(|path| &path == ignored)
        })
    }

    /// Applies filtering rules to a single file.
    fn candidate(
        &mut self,
        entry: walkdir::DirEntry,
    ) -> Result<Option<FileEntry>, SearchError> {
        let path = entry.path();

        if self.is_ignored(path) {
            return Ok(None);
        }

        // walkdir yields paths starting with the root it was given
        let relative_path = path
            .strip_prefix(&self.config.folder)
            .unwrap_or(path)
            .to_owned();

        if !self.config.include_all && export_path::is_hidden(&relative_path) {
            return Ok(self.skip(path, SkipReason::Hidden));
        }

        // links are yielded as such only when not followed
        if entry.file_type().is_symlink() {
            return Ok(self.skip(path, SkipReason::Symlink));
        }

        if relative_path.to_str().is_none() {
            return Ok(self.skip(path, SkipReason::NonUnicode));
        }

        let metadata = entry.metadata()?;
        let size = metadata.len();

        if let Some(max) = self.config.max_item_file_size
            && size > max
        {
            return Ok(self.skip(path, SkipReason::TooLarge { size, max }));
        }

        if let Some(pattern) = self
            .first_matching_pattern(&relative_path)
            .map(str::to_owned)
        {
            return Ok(self.skip(path, SkipReason::Excluded { pattern }));
        }

        let modified = metadata
            .modified()
            .map_err(|source| SearchError::Metadata {
                path: path.to_owned(),
                source,
            })?;

        Ok(Some(FileEntry {
            path: path.to_owned(),
            relative_path,
            size,
            modified,
        }))
    }

    /// Returns first configured pattern (in order of configuration) matching
    /// `relative_path`.
    fn first_matching_pattern(
        &self,
        relative_path: &Path,
    ) -> Option<&str> {
        if self.config.exclude_set.is_empty() {
            return None;
        }

        self.config
            .exclude_set
            .matches(relative_path)
            .into_iter()
            .min()
            .map(|index| self.config.exclude_patterns[index].as_str())
    }

    /// Skips link that walkdir failed to follow, unless it is hidden anyway.
    fn skip_unresolved(
        &mut self,
        path: &Path,
    ) {
        let relative_path = path.strip_prefix(&self.config.folder).unwrap_or(path);
        let reason = if !self.config.include_all && export_path::is_hidden(relative_path) {
            SkipReason::Hidden
        } else {
            SkipReason::BrokenLink
        };
        self.skip(path, reason);
    }

    fn skip(
        &mut self,
        path: &Path,
        reason: SkipReason,
    ) -> Option<FileEntry> {
        self.skipped += 1;
        self.reporter.report(Event::Skipped {
            path: path.to_owned(),
            reason,
        });
        None
    }
}
impl Iterator for Walker<'_> {
    type Item = Result<FileEntry, SearchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(error) => {
                    if let Some(path) = unresolved_link(&error) {
                        self.skip_unresolved(path);
                        continue;
                    }
                    return Some(Err(error.into()));
                }
            };

            // we are interested in files only
            // if follow_links is true, this will be resolved as link target
            if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                continue;
            }

            match self.candidate(entry) {
                Ok(Some(file_entry)) => return Some(Ok(file_entry)),
                Ok(None) => continue,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Path of the link behind `error`, if it is a dangling or looping link.
fn unresolved_link(error: &walkdir::Error) -> Option<&Path> {
    let path = error.path()?;

    let dangling = error
        .io_error()
        .is_some_and(|error| error.kind() == io::ErrorKind::NotFound)
        && path.is_symlink();
    let looping = error.loop_ancestor().is_some();

    (dangling || looping).then_some(path)
}

/// Canonical form of `path`, which may not exist yet (only its parent must).
fn canonical_target(path: &Path) -> Option<PathBuf> {
    if let Ok(path) = fs::canonicalize(path) {
        return Some(path);
    }

    let file_name = path.file_name()?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = fs::canonicalize(parent).ok()?;

    Some(parent.join(file_name))
}
