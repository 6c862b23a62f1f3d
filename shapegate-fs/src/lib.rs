//! Capability-based helpers for reading file selections from disk.
//!
//! Paths are UTF-8 (`camino`) and every read goes through a `cap-std`
//! directory handle opened with ambient authority.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use shapegate_core::RawFile;
use std::io;

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} should include a file name")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Return whether `path` names a directory.
///
/// Paths without a final component, such as `.` or `/`, count as directories.
pub fn path_is_dir(path: &Utf8Path) -> io::Result<bool> {
    if path.file_name().is_none() {
        return Ok(true);
    }
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str())
        .map(|meta| meta.is_dir())
        .map_err(|err| io::Error::new(err.kind(), format!("failed to inspect {path}: {err}")))
}

/// Read one file into a [`RawFile`] named after its final path component.
pub fn read_raw_file(path: &Utf8Path) -> io::Result<RawFile> {
    let (dir, name) = open_dir_and_file(path)?;
    let bytes = dir
        .read(name.as_str())
        .map_err(|err| io::Error::new(err.kind(), format!("failed to read {path}: {err}")))?;
    Ok(RawFile::new(name, bytes))
}

/// List the regular files directly inside `dir`, sorted by name.
pub fn list_dir_files(dir: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let handle = fs_utf8::Dir::open_ambient_dir(dir, ambient_authority())?;
    let mut names = Vec::new();
    for entry in handle.entries()? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name()?);
        }
    }
    names.sort();
    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Read a selection of files and directories into memory.
///
/// Directories contribute their regular files (not recursively), in name
/// order; files are read as given.
pub fn read_selection(paths: &[Utf8PathBuf]) -> io::Result<Vec<RawFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if path_is_dir(path)? {
            for file in list_dir_files(path)? {
                files.push(read_raw_file(&file)?);
            }
        } else {
            files.push(read_raw_file(path)?);
        }
    }
    Ok(files)
}
