//! Export path helpers. Contains [from_file_base_relative_path] that creates
//! the `/`-separated path shared by archive entry name and manifest url.

use std::{
    iter,
    path::{Component, Path, PathBuf},
};

/// Error returned when relative fs path cannot be expressed as export path.
#[derive(thiserror::Error, Debug)]
pub enum ExportPathError {
    /// Path contains something else than plain names, eg. `..` or root.
    #[error("relative path {path:?} must contain only standard path items, got {component}")]
    Component {
        /// Offending path.
        path: PathBuf,
        /// Offending component, debug formatted.
        component: String,
    },
    /// Path component is not valid unicode.
    #[error("path component of {0:?} cannot be converted to string")]
    NonUnicode(PathBuf),
}

/// Creates export path (eg. "/dir1/dir2/file.html") from relative fs path (eg.
/// "dir1\\dir2\\file.html" on windows). Separator is always `/`, regardless of
/// host platform.
///
/// Archive entry is stored under `<hostname><export path>` and manifest url is
/// `<base url><export path>`.
///
/// # Examples
///
/// ```
/// # use afcache_packer::export_path::from_file_base_relative_path;
/// # use std::path::PathBuf;
/// assert_eq!(
///     from_file_base_relative_path(&PathBuf::from("path").join("to").join("file.txt")).unwrap(),
///     "/path/to/file.txt",
/// );
/// ```
pub fn from_file_base_relative_path(file_base_relative_path: &Path) -> Result<String, ExportPathError> {
    // list of path components, eg. ["dir1", "dir2", "file.bin"]
    let file_base_relative_path_components = file_base_relative_path
        .components()
        .map(|component| {
            // we cannot handle things like '/' or '.' or '..' here
            if !matches!(component, Component::Normal(_)) {
                return Err(ExportPathError::Component {
                    path: file_base_relative_path.to_owned(),
                    component: format!("{component:?}"),
                });
            }

            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| ExportPathError::NonUnicode(file_base_relative_path.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // we add empty element at the beginning to have path starting with /
    let export_path = itertools::join(
        iter::once("").chain(file_base_relative_path_components),
        "/",
    );

    Ok(export_path)
}

/// Tells whether file name or any of its parent directories (relative to
/// source folder) starts with `.`.
pub fn is_hidden(file_base_relative_path: &Path) -> bool {
    file_base_relative_path
        .components()
        .any(|component| match component {
            Component::Normal(name) => name.as_encoded_bytes().starts_with(b"."),
            _ => false,
        })
}
