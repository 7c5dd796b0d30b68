//! afcache-packer builds offline cache packages: a single `zip` archive
//! mirroring a directory tree under `<hostname>/`, accompanied by
//! `manifest.afcache` describing, per file, the url it represents and http
//! freshness metadata (`Last-Modified`, `Expires`, optionally mime type).
//!
//! A client application ships the package and pre-seeds its http cache from
//! it, instead of fetching every resource over the network on first run.
//!
//! This crate can be used in two ways:
//! - As a standalone application (`afcache-packer --help`), the usual way in
//!   build scripts / CI pipelines.
//! - As a library, by filling [config::PackageConfig] and running
//!   [packager::Packager].
//!
//! # Using as a standalone application
//!
//! Let's say you have a `site` directory with resources served under
//! `http://www.foo.bar`:
//! ```text
//! site
//! |   index.html
//! |   .htaccess
//! \---css
//!         style.css
//! ```
//! By running:
//! ```text
//! $ afcache-packer \
//!     --folder ./site \
//!     --baseurl http://www.foo.bar \
//!     --maxage 3600 \
//!     --lastmodfile \
//!     --outfile site.zip
//! ```
//! `site.zip` will contain `www.foo.bar/index.html`,
//! `www.foo.bar/css/style.css` and `manifest.afcache`, with lines like:
//! ```text
//! http://www.foo.bar/index.html ; Wed, 01 Jan 2020 00:00:00 GMT+00:00 ; Wed, 01 Jan 2020 01:00:00 GMT+00:00
//! ```
//! Hidden `.htaccess` is skipped, unless `-a` is given.
//!
//! # Using as a library
//!
//! Packaging run consists of four stages, executed strictly in sequence:
//! - [config::validate] checks configuration and derives hostname.
//! - [directory::Walker] lazily finds and filters files.
//! - [file::resolve] computes archive entry name, timestamps and mime type.
//! - [package::Builder] writes files and the manifest into the archive.
//!
//! [packager::Packager] combines all of them. Progress is reported through
//! injected [report::Reporter], eg. [report::LogReporter].
//!
//! ### Examples
//! ```no_run
//! # use anyhow::Error;
//! # use std::path::PathBuf;
//! # use afcache_packer::{
//! #     config::{PackageConfig, TimestampSource},
//! #     packager::Packager,
//! #     report::LogReporter,
//! # };
//! # fn main() -> Result<(), Error> {
//! let packager = Packager::new(
//!     PackageConfig {
//!         folder: Some(PathBuf::from("site")),
//!         base_url: Some("http://www.foo.bar".to_owned()),
//!         max_age: Some(3600),
//!         output_path: Some(PathBuf::from("site.zip")),
//!         timestamp_source: TimestampSource::FileModified,
//!         ..PackageConfig::default()
//!     },
//!     &LogReporter,
//! )?;
//!
//! let summary = packager.run()?;
//! println!("{} files packaged", summary.files_added());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use afcache_pack_common as common;

pub mod config;
pub mod directory;
pub mod export_path;
pub mod file;
pub mod package;
pub mod packager;
pub mod report;
