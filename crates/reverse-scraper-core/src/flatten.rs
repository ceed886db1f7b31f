//! Post-run cleanup: folders that ended up holding only one file are folded
//! back into the shared no-match folder.

use log::{debug, info};
use std::ffi::OsStr;
use std::path::Path;

use crate::error::Result;
use crate::fileops::{create_folder, list_folder, move_file, remove_empty_dir};

/// Move the lone file of every single-file subfolder of `output_dir` into
/// `output_dir/no_match_folder` and drop the emptied subfolder. Subfolders
/// that are already empty are removed as well.
///
/// Returns the number of files moved.
pub fn extract_single_file_folders(output_dir: &Path, no_match_folder: &str) -> Result<usize> {
    let shared = create_folder(&output_dir.join(no_match_folder))?;
    let mut moved = 0;

    for name in list_folder(output_dir)? {
        if name.as_os_str() == OsStr::new(no_match_folder) {
            continue;
        }
        let folder = output_dir.join(&name);
        if !folder.is_dir() {
            continue;
        }

        let entries = list_folder(&folder)?;
        if entries.is_empty() {
            remove_empty_dir(&folder)?;
            continue;
        }
        let [only] = entries.as_slice() else {
            debug!("Keeping {} ({} entries)", folder.display(), entries.len());
            continue;
        };
        if !folder.join(only).is_file() {
            continue;
        }

        move_file(only, &folder, &shared)?;
        remove_empty_dir(&folder)?;
        moved += 1;
    }

    info!("Extracted {} files into {}", moved, shared.display());
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SHARED: &str = "(-) Default Results";

    #[test]
    fn test_single_file_folders_are_flattened() {
        let dir = tempdir().unwrap();
        let output = dir.path();

        let lonely = output.join("cat(jpg)");
        fs::create_dir_all(&lonely).unwrap();
        fs::write(lonely.join("cat.jpg"), b"cat").unwrap();

        let full = output.join("dog(png)");
        fs::create_dir_all(&full).unwrap();
        fs::write(full.join("dog.png"), b"dog").unwrap();
        fs::write(full.join("big.png"), b"big").unwrap();

        let moved = extract_single_file_folders(output, SHARED).unwrap();

        assert_eq!(moved, 1);
        assert!(output.join(SHARED).join("cat.jpg").exists());
        assert!(!lonely.exists());
        assert!(full.join("dog.png").exists());
    }

    #[test]
    fn test_collision_in_shared_folder_is_renamed() {
        let dir = tempdir().unwrap();
        let output = dir.path();
        fs::create_dir_all(output.join(SHARED)).unwrap();
        fs::write(output.join(SHARED).join("cat.jpg"), b"first").unwrap();

        let lonely = output.join("cat(jpg)");
        fs::create_dir_all(&lonely).unwrap();
        fs::write(lonely.join("cat.jpg"), b"second").unwrap();

        assert_eq!(extract_single_file_folders(output, SHARED).unwrap(), 1);
        assert!(output.join(SHARED).join("cat(1).jpg").exists());
    }

    #[test]
    fn test_empty_folder_is_removed() {
        let dir = tempdir().unwrap();
        let output = dir.path();
        fs::create_dir_all(output.join("cat(jpg)")).unwrap();

        assert_eq!(extract_single_file_folders(output, SHARED).unwrap(), 0);
        assert!(!output.join("cat(jpg)").exists());
        assert!(output.join(SHARED).is_dir());
    }

    #[test]
    fn test_nested_folder_is_left_alone() {
        let dir = tempdir().unwrap();
        let output = dir.path();
        fs::create_dir_all(output.join("outer").join("inner")).unwrap();

        assert_eq!(extract_single_file_folders(output, SHARED).unwrap(), 0);
        assert!(output.join("outer").join("inner").is_dir());
    }
}
