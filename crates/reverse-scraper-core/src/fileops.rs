//! Filesystem collaborators: folder setup, collision-safe moves and writes.
//!
//! Nothing in here ever overwrites an existing file. When a name is taken the
//! lowest free `name(n).ext` is used instead.

use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};

/// How hard to try when persisting a candidate image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for SavePolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(100),
        }
    }
}

/// Create a folder (and its parents) unless it already exists
pub fn create_folder(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }

    fs::create_dir_all(path).map_err(|source| {
        log_file_error(path, "create_dir", &source);
        Error::FolderCreation {
            path: path.to_path_buf(),
            source,
        }
    })?;
    log_fs_modification("create_dir", path, None);
    Ok(path.to_path_buf())
}

/// Create a base folder and return its canonical absolute form.
///
/// On Windows the canonical form is the verbatim `\\?\` path, which lifts
/// the legacy path length limit for everything joined beneath it.
pub fn resolve_base(path: &Path) -> Result<PathBuf> {
    create_folder(path)?;
    fs::canonicalize(path).map_err(|source| Error::FolderCreation {
        path: path.to_path_buf(),
        source,
    })
}

/// Names of every entry in a folder, sorted
pub fn list_folder(path: &Path) -> Result<Vec<OsString>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        names.push(entry?.file_name());
    }
    names.sort();
    Ok(names)
}

/// Split a file name at its last dot into stem and extension (without dot)
pub fn split_name(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    (path.file_stem().unwrap_or(name), path.extension())
}

/// Folder name for a source image's matches: `photo.jpg` -> `photo(jpg)`
pub fn source_folder_name(name: impl AsRef<OsStr>) -> OsString {
    let (stem, ext) = split_name(name.as_ref());
    let mut folder = stem.to_os_string();
    if let Some(ext) = ext {
        folder.push("(");
        folder.push(ext);
        folder.push(")");
    }
    folder
}

/// The `n`th alternative for a taken name: `photo.jpg` -> `photo(n).jpg`
pub fn numbered_name(name: impl AsRef<OsStr>, n: u32) -> OsString {
    let (stem, ext) = split_name(name.as_ref());
    let mut numbered = stem.to_os_string();
    numbered.push(format!("({})", n));
    if let Some(ext) = ext {
        numbered.push(".");
        numbered.push(ext);
    }
    numbered
}

fn candidate_name(name: &OsStr, n: u32) -> OsString {
    if n == 0 {
        name.to_os_string()
    } else {
        numbered_name(name, n)
    }
}

/// Move `name` from `from` into `to`, renaming on collision.
/// Returns the final path.
pub fn move_file(name: impl AsRef<OsStr>, from: &Path, to: &Path) -> Result<PathBuf> {
    let name = name.as_ref();
    let source = from.join(name);
    if !source.exists() {
        return Err(Error::FileNotFound(source));
    }

    let mut n = 0;
    let destination = loop {
        let destination = to.join(candidate_name(name, n));
        if fs::symlink_metadata(&destination).is_err() {
            break destination;
        }
        n += 1;
    };

    if let Err(rename_err) = fs::rename(&source, &destination) {
        // Renames fail across filesystems; fall back to copy and remove
        fs::copy(&source, &destination).map_err(|_| {
            log_file_error(&source, "move", &rename_err);
            rename_err
        })?;
        fs::remove_file(&source)?;
    }

    log_fs_modification(
        "move",
        &destination,
        Some(&format!("from {}", source.display())),
    );
    Ok(destination)
}

/// Create an empty file whose name carries the message
pub fn write_marker_file(dir: &Path, title: &str) -> Result<PathBuf> {
    let path = dir.join(title);
    OpenOptions::new().create(true).append(true).open(&path)?;
    log_fs_modification("write_marker", &path, None);
    Ok(path)
}

/// Write `bytes` into `dir` under `name`, renaming on collision and retrying
/// transient failures according to `policy`.
pub fn save_bytes(dir: &Path, name: &str, bytes: &[u8], policy: &SavePolicy) -> Result<PathBuf> {
    let mut failures = 0;
    let mut n = 0;

    loop {
        let path = dir.join(candidate_name(OsStr::new(name), n));
        match write_new(&path, bytes) {
            Ok(()) => {
                log_fs_modification("save", &path, Some(&format!("{} bytes", bytes.len())));
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                n += 1;
            }
            Err(e) => {
                failures += 1;
                log_file_error(&path, "save", &e);
                if failures >= policy.attempts {
                    return Err(Error::Io(e));
                }
                thread::sleep(policy.delay);
            }
        }
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

/// Delete a folder if it holds nothing. Returns whether it was removed.
pub fn remove_empty_dir(dir: &Path) -> Result<bool> {
    if fs::read_dir(dir)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir)?;
    log_fs_modification("remove_dir", dir, None);
    Ok(true)
}
