//! Reporting helpers. Packaging stages never log directly, instead they send
//! [Event]s to a [Reporter] passed into the
//! [Packager](crate::packager::Packager).
//!
//! Use [LogReporter] to forward events into [log] facade, or
//! [RecordingReporter] to inspect them (eg. in tests).

use log::Level;
use std::{fmt, path::PathBuf, sync::Mutex};

/// Reason for leaving a file out of the package.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SkipReason {
    /// File name or one of its parent directories starts with `.`.
    Hidden,
    /// Symbolic link, while links are not followed.
    Symlink,
    /// Followed link points to nothing or to one of its own ancestors.
    BrokenLink,
    /// Relative path is not valid unicode, so it has no url.
    NonUnicode,
    /// File is larger than configured maximum.
    TooLarge {
        /// File size in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },
    /// File relative path matches exclude pattern.
    Excluded {
        /// First configured pattern that matched.
        pattern: String,
    },
}
impl fmt::Display for SkipReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "hidden file"),
            Self::Symlink => write!(f, "symbolic link not followed"),
            Self::BrokenLink => write!(f, "unresolvable link"),
            Self::NonUnicode => write!(f, "name is not valid unicode"),
            Self::TooLarge { size, max } => write!(f, "big file ({size} > {max} bytes)"),
            Self::Excluded { pattern } => write!(f, "excluded by {pattern:?}"),
        }
    }
}

/// Something worth reporting that happened during packaging.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Event {
    /// File was written to the archive under `export_path`.
    Added {
        /// Path of the file on fs.
        path: PathBuf,
        /// Path of the entry inside archive.
        export_path: String,
    },
    /// File was found, but left out.
    Skipped {
        /// Path of the file on fs.
        path: PathBuf,
        /// Why.
        reason: SkipReason,
    },
    /// Mime type was requested, but could not be determined. Record is written
    /// without it.
    MimeTypeUnknown {
        /// Path of the file on fs.
        path: PathBuf,
    },
    /// Manifest entry was written.
    ManifestAdded {
        /// Number of records in manifest.
        records: usize,
    },
}
impl Event {
    /// Severity of the event.
    pub fn level(&self) -> Level {
        match self {
            Self::Added { .. } => Level::Debug,
            Self::Skipped { .. } => Level::Info,
            Self::MimeTypeUnknown { .. } => Level::Warn,
            Self::ManifestAdded { .. } => Level::Info,
        }
    }
}
impl fmt::Display for Event {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Added { export_path, .. } => write!(f, "adding {export_path}"),
            Self::Skipped { path, reason } => {
                write!(f, "skipping {} ({reason})", path.display())
            }
            Self::MimeTypeUnknown { path } => {
                write!(f, "unknown mime type for {}", path.display())
            }
            Self::ManifestAdded { records } => {
                write!(f, "adding manifest ({records} records)")
            }
        }
    }
}

/// Receiver of packaging [Event]s.
pub trait Reporter {
    /// Called for each event, in order of occurrence.
    fn report(
        &self,
        event: Event,
    );
}

/// [Reporter] forwarding events to [log] at [Event::level].
#[derive(Debug, Default)]
pub struct LogReporter;
impl Reporter for LogReporter {
    fn report(
        &self,
        event: Event,
    ) {
        log::log!(event.level(), "{event}");
    }
}

/// [Reporter] storing all events in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}
impl RecordingReporter {
    /// Creates empty [self].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns copy of all events reported so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}
impl Reporter for RecordingReporter {
    fn report(
        &self,
        event: Event,
    ) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
