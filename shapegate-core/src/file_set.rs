//! Group raw file selections into a [`ShapefileBundle`].
//!
//! Resolution is pure: it inspects names only and copies the selected bytes
//! into the resulting bundle.

use std::collections::HashMap;

use thiserror::Error;

use crate::bundle::{ARCHIVE_EXTENSION, RawFile, ShapefileBundle, ShapefileComponents};

/// Component extensions in the order their presence is checked.
pub const REQUIRED_EXTENSIONS: [&str; 4] = ["shp", "dbf", "prj", "shx"];

/// Errors returned by [`resolve_file_set`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileSetError {
    /// The selection was empty.
    #[error("no files provided")]
    NoFiles,
    /// A file name has no stem or no extension.
    #[error("Invalid filename {name}: must have a name and a file extension")]
    InvalidFilename {
        /// The offending file name.
        name: String,
    },
    /// The selected files do not share one stem.
    #[error("Filenames do not match")]
    FilenamesDoNotMatch,
    /// A mandatory component is absent.
    ///
    /// Only the first missing extension is reported.
    #[error("Missing .{extension} component")]
    MissingComponent {
        /// Extension of the missing component, without the leading dot.
        extension: &'static str,
    },
}

/// Split a file name into its stem and lower-cased extension.
///
/// The extension is everything after the last `.`. Returns `None` when either
/// part is empty.
pub fn split_file_name(name: &str) -> Option<(&str, String)> {
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some((stem, extension.to_ascii_lowercase()))
}

/// Resolve a selection of raw files into a [`ShapefileBundle`].
///
/// A lone `.zip` file becomes an archive bundle. Anything else must be a set
/// of files sharing one stem that covers `.shp`, `.dbf`, `.prj` and `.shx`;
/// extra extensions are ignored.
///
/// # Examples
///
/// ```
/// use shapegate_core::{RawFile, resolve_file_set};
///
/// let files = vec![RawFile::new("sites.zip", vec![0x50, 0x4b])];
/// let bundle = resolve_file_set(&files)?;
/// assert_eq!(bundle.name(), "sites");
/// assert!(bundle.is_archive());
/// # Ok::<(), shapegate_core::FileSetError>(())
/// ```
pub fn resolve_file_set(files: &[RawFile]) -> Result<ShapefileBundle, FileSetError> {
    let [first, rest @ ..] = files else {
        return Err(FileSetError::NoFiles);
    };

    if rest.is_empty()
        && let Some((stem, extension)) = split_file_name(&first.name)
        && extension == ARCHIVE_EXTENSION
    {
        return Ok(ShapefileBundle::from_archive(stem, first.bytes.clone()));
    }

    let (expected_stem, _) = split_valid(first)?;
    let mut by_extension: HashMap<String, &RawFile> = HashMap::with_capacity(files.len());
    for file in files {
        let (stem, extension) = split_valid(file)?;
        if stem != expected_stem {
            return Err(FileSetError::FilenamesDoNotMatch);
        }
        by_extension.entry(extension).or_insert(file);
    }

    let mut take = |extension: &'static str| {
        by_extension
            .remove(extension)
            .map(|file| file.bytes.clone())
            .ok_or(FileSetError::MissingComponent { extension })
    };
    let [shp_ext, dbf_ext, prj_ext, shx_ext] = REQUIRED_EXTENSIONS;
    let components = ShapefileComponents {
        shp: take(shp_ext)?,
        dbf: take(dbf_ext)?,
        prj: take(prj_ext)?,
        shx: take(shx_ext)?,
    };
    Ok(ShapefileBundle::from_components(expected_stem, components))
}

fn split_valid(file: &RawFile) -> Result<(&str, String), FileSetError> {
    split_file_name(&file.name).ok_or_else(|| FileSetError::InvalidFilename {
        name: file.name.clone(),
    })
}
