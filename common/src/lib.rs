//! Common crate, containing types shared between
//! `afcache-packer` and any consumer of an
//! afcache package (eg. a client pre-seeding its http cache).
//!
//! A package is a plain `zip` archive. Every packaged file is stored under
//! `<hostname>/<relative path>`, and one additional entry, named
//! [MANIFEST_FILE_NAME], describes each of them with a [manifest::Record]:
//! the url the file represents and http freshness metadata (last modified,
//! expires, optional mime type).
//!
//! Timestamps inside the manifest use the format from [http_date].

#![warn(missing_docs)]

pub mod http_date;
pub mod manifest;

/// Name of the reserved archive entry holding the manifest.
pub const MANIFEST_FILE_NAME: &str = "manifest.afcache";

/// Separator between fields of a single manifest line.
pub const MANIFEST_FIELD_SEPARATOR: &str = " ; ";
