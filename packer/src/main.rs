//! Main packer executable, to be used as cli tool. For help run this command
//! with `-h`.

#![warn(missing_docs)]

use afcache_packer::{
    config::{PackageConfig, TimestampSource},
    packager::{Packager, Summary},
    report::LogReporter,
};
use anyhow::{Context, Error};
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{path::PathBuf, process::ExitCode};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Arguments {
    /// Folder containing resources.
    #[arg(long)]
    pub folder: Option<PathBuf>,

    /// Base url, eg. http://www.foo.bar (without trailing slash).
    #[arg(long = "baseurl")]
    pub base_url: Option<String>,

    /// Max-age in seconds, added to last modified date to get expiry date.
    #[arg(long = "maxage")]
    pub max_age: Option<u64>,

    /// Output filename.
    #[arg(long = "outfile", default_value = "afcache-archive.zip")]
    pub output_path: PathBuf,

    /// Include all files. By default, files starting with a dot (or inside
    /// directories starting with a dot) are excluded.
    #[arg(short = 'a')]
    pub include_all: bool,

    /// Maximum filesize of a cacheable item, in bytes.
    #[arg(long = "maxItemFileSize")]
    pub max_item_file_size: Option<u64>,

    /// Glob pattern of files to exclude, matched against path relative to
    /// folder. Can be given multiple times.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude_patterns: Vec<String>,

    /// Append mime type (guessed from file extension) to each manifest line.
    #[arg(long = "mime")]
    pub mime_types: bool,

    /// Use file's modification time as last modified date, instead of
    /// packaging time.
    #[arg(long = "lastmodfile")]
    pub last_modified_file: bool,

    /// Add n seconds to last modified date.
    #[arg(long = "lastmodifiedplus", conflicts_with = "last_modified_minus")]
    pub last_modified_plus: Option<u64>,

    /// Subtract n seconds from last modified date.
    #[arg(long = "lastmodifiedminus")]
    pub last_modified_minus: Option<u64>,

    /// Do not follow symbolic links while traversing folder, skip them
    /// instead.
    #[arg(long)]
    pub no_follow_links: bool,

    /// Sort directory entries by name, giving stable entry order.
    #[arg(long)]
    pub sort: bool,

    /// Log every added and skipped file.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log warnings and errors only.
    #[arg(short, long)]
    pub quiet: bool,
}
impl Arguments {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    pub fn into_package_config(self) -> PackageConfig {
        let timestamp_source = if self.last_modified_file {
            TimestampSource::FileModified
        } else {
            TimestampSource::PackagingTime
        };

        PackageConfig {
            folder: self.folder,
            base_url: self.base_url,
            max_age: self.max_age,
            output_path: Some(self.output_path),
            include_all: self.include_all,
            max_item_file_size: self.max_item_file_size,
            exclude_patterns: self.exclude_patterns,
            mime_types: self.mime_types,
            timestamp_source,
            last_modified_plus: self.last_modified_plus,
            last_modified_minus: self.last_modified_minus,
            follow_links: !self.no_follow_links,
            sort_entries: self.sort,
        }
    }
}

fn main() -> Result<ExitCode, Error> {
    let arguments = Arguments::parse();

    SimpleLogger::new()
        .with_level(arguments.log_level())
        .init()
        .context("logger init")?;

    // failures are logged here and not returned, so they are printed once
    match run(arguments) {
        Ok(summary) => {
            log::info!(
                "{} files packaged into {:?}, {} skipped",
                summary.files_added(),
                summary.output_path,
                summary.files_skipped,
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            log::error!("{error:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run(arguments: Arguments) -> Result<Summary, Error> {
    let reporter = LogReporter;
    let packager = Packager::new(arguments.into_package_config(), &reporter)
        .context("invalid configuration")?;

    let summary = packager.run().context("packaging failed")?;

    Ok(summary)
}
