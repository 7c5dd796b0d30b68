//! Packager helpers. Contains [Packager], running the whole packaging process:
//! validation, directory traversal, metadata resolution and archive writing.

use crate::{
    common::manifest::Manifest,
    config::{self, ConfigErrors, PackageConfig, ValidatedConfig},
    directory::Walker,
    file,
    package::{self, PackageError},
    report::{Event, Reporter},
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of successful [Packager::run].
#[derive(Debug)]
pub struct Summary {
    /// Archive path.
    pub output_path: PathBuf,
    /// Number of files skipped by filtering rules.
    pub files_skipped: usize,
    /// Manifest written into the archive, one record per packaged file.
    pub manifest: Manifest,
}
impl Summary {
    /// Number of files written into the archive (manifest not included).
    pub fn files_added(&self) -> usize {
        self.manifest.records.len()
    }
}

/// Builds a single package from validated configuration, reporting progress to
/// injected [Reporter].
pub struct Packager<'r> {
    config: ValidatedConfig,
    reporter: &'r dyn Reporter,
}
impl<'r> Packager<'r> {
    /// Validates `config` and creates [self]. On failure nothing is created on
    /// fs and all configuration problems are returned.
    pub fn new(
        config: PackageConfig,
        reporter: &'r dyn Reporter,
    ) -> Result<Self, ConfigErrors> {
        let config = config::validate(config)?;

        Ok(Self { config, reporter })
    }

    /// Validated configuration used by this packager.
    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    /// Builds the package, using current time as packaging time.
    pub fn run(&self) -> Result<Summary, PackageError> {
        self.run_at(Utc::now())
    }

    /// Builds the package, with `packaging_time` used as base timestamp when
    /// configured so, and as modification time of the manifest entry. With
    /// sorted entries and the same tree, the same `packaging_time` yields an
    /// identical archive.
    ///
    /// Archive is created before traversal starts, so unusable output path
    /// fails the run before anything is read. Any error removes the partially
    /// written archive, output path is replaced only on success.
    pub fn run_at(
        &self,
        packaging_time: DateTime<Utc>,
    ) -> Result<Summary, PackageError> {
        let mut builder = package::Builder::create(&self.config.output_path)?;

        let mut walker = Walker::new(&self.config, self.reporter)
            .ignore(builder.temporary_path())
            .ignore(&self.config.output_path);

        for file_entry in walker.by_ref() {
            let file_entry = file_entry?;
            let resolved_file =
                file::resolve(&file_entry, &self.config, packaging_time, self.reporter)?;

            self.reporter.report(Event::Added {
                path: file_entry.path,
                export_path: resolved_file.export_path.clone(),
            });
            builder.file_add(resolved_file, file_entry.size)?;
        }
        let files_skipped = walker.skipped_count();

        self.reporter.report(Event::ManifestAdded {
            records: builder.files_count(),
        });
        let manifest = builder.finalize(&packaging_time)?;

        Ok(Summary {
            output_path: self.config.output_path.clone(),
            files_skipped,
            manifest,
        })
    }
}
