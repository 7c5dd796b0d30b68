//! File helpers. Contains [resolve], turning a [FileEntry] found in the source
//! folder into its archive entry name and manifest [Record].

use crate::{
    common::manifest::Record,
    config::{TimestampSource, ValidatedConfig},
    directory::FileEntry,
    export_path::{self, ExportPathError},
    report::{Event, Reporter},
};
use chrono::{DateTime, SubsecRound, Utc};
use std::path::{Path, PathBuf};

/// Error returned when file metadata cannot be resolved.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Relative path cannot be expressed as export path.
    #[error(transparent)]
    ExportPath(#[from] ExportPathError),
    /// Timestamp with offset or max age applied is not representable.
    #[error("timestamp of {0:?} is out of range")]
    TimestampOutOfRange(PathBuf),
}

/// Extensions with mime type forced regardless of [mime_guess] table.
const MIME_TYPE_OVERRIDES: &[(&str, &str)] = &[("json", "application/json")];

/// File with everything needed to write it into the archive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ResolvedFile {
    /// Path of the file on fs.
    pub path: PathBuf,
    /// Name of the archive entry, `<hostname>/<relative path>`.
    pub export_path: String,
    /// Manifest line describing the file.
    pub record: Record,
}

/// Resolves archive entry name, timestamps and (optionally) mime type of
/// `file_entry`.
///
/// Base timestamp is either file modification time or `packaging_time`,
/// depending on [TimestampSource]. Configured offset is applied to it to get
/// `Last-Modified`, then max age is added to get `Expires`. Both have their
/// sub-second part dropped.
///
/// If mime type was requested, but cannot be determined from file extension,
/// [Event::MimeTypeUnknown] is reported and the record has no mime type.
pub fn resolve(
    file_entry: &FileEntry,
    config: &ValidatedConfig,
    packaging_time: DateTime<Utc>,
    reporter: &dyn Reporter,
) -> Result<ResolvedFile, ResolveError> {
    let relative_export_path = export_path::from_file_base_relative_path(&file_entry.relative_path)?;

    let base_timestamp = match config.timestamp_source {
        TimestampSource::FileModified => DateTime::<Utc>::from(file_entry.modified),
        TimestampSource::PackagingTime => packaging_time,
    }
    .trunc_subsecs(0);

    let out_of_range = || ResolveError::TimestampOutOfRange(file_entry.path.clone());
    let last_modified = base_timestamp
        .checked_add_signed(config.timestamp_offset)
        .ok_or_else(out_of_range)?;
    let expires = last_modified
        .checked_add_signed(config.max_age)
        .ok_or_else(out_of_range)?;

    let mime_type = if config.mime_types {
        let mime_type = mime_type_from_path(&file_entry.path);
        if mime_type.is_none() {
            reporter.report(Event::MimeTypeUnknown {
                path: file_entry.path.clone(),
            });
        }
        mime_type
    } else {
        None
    };

    Ok(ResolvedFile {
        path: file_entry.path.clone(),
        export_path: format!("{}{}", config.hostname, relative_export_path),
        record: Record {
            url: format!("{}{}", config.base_url, relative_export_path),
            last_modified,
            expires,
            mime_type,
        },
    })
}

/// Guesses mime type from file extension. Only path is used, file content is
/// not read.
fn mime_type_from_path(path: &Path) -> Option<String> {
    let extension = path.extension().and_then(|extension| extension.to_str());

    if let Some(extension) = extension
        && let Some((_, mime_type)) = MIME_TYPE_OVERRIDES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(extension))
    {
        return Some((*mime_type).to_owned());
    }

    mime_guess::from_path(path)
        .first()
        .map(|mime_type| mime_type.essence_str().to_owned())
}
