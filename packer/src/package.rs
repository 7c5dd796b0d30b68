//! Package helpers. Contains [Builder], writing resolved files and the manifest
//! into a `zip` archive.

use crate::{
    common::{MANIFEST_FILE_NAME, manifest::Manifest},
    directory::SearchError,
    file::{ResolveError, ResolvedFile},
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use zip::{CompressionMethod, ZipWriter, result::ZipError, write::SimpleFileOptions};

/// Error aborting a packaging run.
#[derive(thiserror::Error, Debug)]
pub enum PackageError {
    /// Archive could not be created in output location.
    #[error("creation of archive {path:?} failed")]
    ArchiveCreate {
        /// Requested output path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
    /// Source folder traversal failed.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// File metadata could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// File content could not be copied into archive.
    #[error("cannot copy {path:?} into archive")]
    Copy {
        /// Source file.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
    /// Archive entry could not be started or written.
    #[error("writing archive entry {name:?} failed")]
    Entry {
        /// Entry name.
        name: String,
        /// Cause.
        #[source]
        source: ZipError,
    },
    /// Archive central directory could not be written.
    #[error("finalizing archive failed")]
    Finalize(#[source] ZipError),
    /// Complete archive could not be moved to output path.
    #[error("cannot store archive as {path:?}")]
    Persist {
        /// Requested output path.
        path: PathBuf,
        /// Cause.
        #[source]
        source: io::Error,
    },
}

/// Main builder for the archive. Files are streamed into a temporary archive
/// next to output path as they are added, manifest records are kept in
/// memory.
///
/// The temporary archive is moved to output path only by [Self::finalize], if
/// builder is dropped before that (eg. on error), it is removed and output
/// path is left untouched.
pub struct Builder {
    writer: ZipWriter<NamedTempFile>,
    temporary_path: PathBuf,
    output_path: PathBuf,
    manifest: Manifest,
}
impl Builder {
    /// Creates empty archive, to be moved to `output_path` when finalized.
    pub fn create(output_path: &Path) -> Result<Self, PackageError> {
        let archive_create_error = |source| PackageError::ArchiveCreate {
            path: output_path.to_owned(),
            source,
        };

        if output_path.is_dir() {
            return Err(archive_create_error(io::Error::from(
                io::ErrorKind::IsADirectory,
            )));
        }

        let directory = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(".afcache-")
            .suffix(".zip.tmp")
            .tempfile_in(directory)
            .map_err(archive_create_error)?;
        let temporary_path = file.path().to_owned();

        Ok(Self {
            writer: ZipWriter::new(file),
            temporary_path,
            output_path: output_path.to_owned(),
            manifest: Manifest::default(),
        })
    }

    /// Path of the archive while it is being written.
    pub fn temporary_path(&self) -> &Path {
        &self.temporary_path
    }

    /// Number of files added so far.
    pub fn files_count(&self) -> usize {
        self.manifest.records.len()
    }

    /// Copies file content into the archive under its export path and
    /// appends its manifest record.
    pub fn file_add(
        &mut self,
        resolved_file: ResolvedFile,
        size: u64,
    ) -> Result<(), PackageError> {
        let ResolvedFile {
            path,
            export_path,
            record,
        } = resolved_file;

        let mut file = fs::File::open(&path).map_err(|source| PackageError::Copy {
            path: path.clone(),
            source,
        })?;

        let options = entry_options(&record.last_modified).large_file(size >= u32::MAX as u64);
        self.writer
            .start_file(export_path.as_str(), options)
            .map_err(|source| PackageError::Entry {
                name: export_path.clone(),
                source,
            })?;
        io::copy(&mut file, &mut self.writer)
            .map_err(|source| PackageError::Copy { path, source })?;

        self.manifest.records.push(record);

        Ok(())
    }

    /// Writes the manifest entry (with `timestamp` as its modification time),
    /// finishes the archive and moves it to output path. Returns the manifest
    /// written.
    pub fn finalize(
        mut self,
        timestamp: &DateTime<Utc>,
    ) -> Result<Manifest, PackageError> {
        let manifest_text = self.manifest.render();

        let entry_error = |source| PackageError::Entry {
            name: MANIFEST_FILE_NAME.to_owned(),
            source,
        };
        self.writer
            .start_file(MANIFEST_FILE_NAME, entry_options(timestamp))
            .map_err(entry_error)?;
        io::Write::write_all(&mut self.writer, manifest_text.as_bytes())
            .map_err(|source| entry_error(ZipError::Io(source)))?;

        let file = self.writer.finish().map_err(PackageError::Finalize)?;

        let persist_error = |source| PackageError::Persist {
            path: self.output_path.clone(),
            source,
        };
        file.as_file().sync_all().map_err(persist_error)?;
        file.persist(&self.output_path)
            .map_err(|error| persist_error(error.error))?;

        Ok(self.manifest)
    }
}

/// Entry options, with entry modification time set to `timestamp` if it fits
/// in `zip` date range (1980-2107).
fn entry_options(timestamp: &DateTime<Utc>) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    match zip_date_time(timestamp) {
        Some(date_time) => options.last_modified_time(date_time),
        None => options,
    }
}

fn zip_date_time(timestamp: &DateTime<Utc>) -> Option<zip::DateTime> {
    zip::DateTime::from_date_and_time(
        u16::try_from(timestamp.year()).ok()?,
        timestamp.month() as u8,
        timestamp.day() as u8,
        timestamp.hour() as u8,
        timestamp.minute() as u8,
        timestamp.second() as u8,
    )
    .ok()
}
