use std::ffi::OsString;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extensions accepted for upload, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Returns if the given path has a searchable image extension
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List the image files directly inside `directory`, sorted by name.
///
/// Subfolders are not descended into. An input folder without any image
/// is an error: there is nothing to do.
pub fn list_input_images(directory: &Path) -> Result<Vec<OsString>> {
    if !directory.exists() {
        return Err(Error::FileNotFound(directory.to_path_buf()));
    }

    let mut names: Vec<OsString> = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_image_path(e.path()))
        .map(|e| e.file_name().to_os_string())
        .collect();

    if names.is_empty() {
        return Err(Error::EmptyInput(directory.to_path_buf()));
    }

    names.sort();
    Ok(names)
}

// -- Tests --
