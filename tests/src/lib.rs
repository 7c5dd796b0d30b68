#![doc(hidden)]

use afcache_pack_common::{MANIFEST_FILE_NAME, manifest::Manifest};
use afcache_packer::config::PackageConfig;
use anyhow::{Context, Error, anyhow};
use chrono::{DateTime, Utc};
use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tempfile::TempDir;
use zip::ZipArchive;

// source directory to be packaged and separate directory for the output
pub struct Fixture {
    pub source: TempDir,
    pub output: TempDir,
}
impl Fixture {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            source: TempDir::new()?,
            output: TempDir::new()?,
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.path().join("afcache-archive.zip")
    }

    // writes file under source directory, creating parents, optionally
    // setting its modification time
    pub fn file_write(
        &self,
        relative_path: &str,
        content: &[u8],
        modified: Option<DateTime<Utc>>,
    ) -> Result<PathBuf, Error> {
        let path = self.source.path().join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;

        if let Some(modified) = modified {
            File::options()
                .write(true)
                .open(&path)?
                .set_modified(SystemTime::from(modified))?;
        }

        Ok(path)
    }

    // configuration used by most of tests, packaging source into output
    pub fn config(&self) -> PackageConfig {
        PackageConfig {
            folder: Some(self.source.path().to_owned()),
            base_url: Some("http://example.com".to_owned()),
            max_age: Some(3600),
            output_path: Some(self.output_path()),
            ..PackageConfig::default()
        }
    }
}

// contents of a package read back from fs
#[derive(Debug)]
pub struct PackageContents {
    // names of entries in archive order, manifest excluded
    pub entry_names: Vec<String>,
    // raw manifest text
    pub manifest_text: String,
    pub manifest: Manifest,
}
impl PackageContents {
    pub fn read(path: &Path) -> Result<Self, Error> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let mut entry_names = Vec::new();
        let mut manifest_text = None;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.name() == MANIFEST_FILE_NAME {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                manifest_text = Some(text);
            } else {
                entry_names.push(entry.name().to_owned());
            }
        }

        let manifest_text = manifest_text.ok_or_else(|| anyhow!("manifest missing"))?;
        let manifest = Manifest::parse(&manifest_text).context("manifest parse")?;

        Ok(Self {
            entry_names,
            manifest_text,
            manifest,
        })
    }

    pub fn urls(&self) -> Vec<&str> {
        self.manifest
            .records
            .iter()
            .map(|record| record.url.as_str())
            .collect()
    }
}

// reads single entry content from archive
pub fn entry_content(
    path: &Path,
    name: &str,
) -> Result<Vec<u8>, Error> {
    let mut archive = ZipArchive::new(File::open(path)?)?;
    let mut entry = archive.by_name(name)?;

    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;

    Ok(content)
}
