/*
File: menusync-aio/src/fs.rs
Purpose: Primitive synchronous filesystem operations.
*/
use std::{
    fs::{self, Permissions},
    io::{self, Write},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Arc,
};

use menusync_common::error::{MenuError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Creates a directory and all its parent components if they are missing.
pub fn create_dir_all(path: &Path) -> Result<()> {
    debug!("Creating directory recursively: {}", path.display());
    fs::create_dir_all(path).map_err(|e| {
        error!("Failed create dir {}: {}", path.display(), e);
        MenuError::from(e)
    })
}

/// Removes a file. A file that is already gone counts as removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    debug!("Removing file: {}", path.display());
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("File {} already removed.", path.display());
            Ok(false)
        }
        Err(e) => {
            error!("Failed remove file {}: {}", path.display(), e);
            Err(MenuError::from(e))
        }
    }
}

/// Removes a directory and all its contents. A missing directory is a no-op.
pub fn remove_directory_recursive(path: &Path) -> Result<bool> {
    debug!("Removing directory recursively: {}", path.display());
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            error!("Failed remove dir_all {}: {}", path.display(), e);
            Err(MenuError::from(e))
        }
    }
}

/// Reads the entire contents of a file into a string.
pub fn read_to_string(path: &Path) -> Result<String> {
    debug!("Reading file to string: {}", path.display());
    fs::read_to_string(path).map_err(|e| {
        error!("Failed read file {}: {}", path.display(), e);
        MenuError::from(e)
    })
}

/// Reads a file to a string, `None` if it does not exist.
pub fn read_optional_string(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => {
            error!("Failed read file {}: {}", path.display(), e);
            Err(MenuError::from(e))
        }
    }
}

/// Reads the entire contents of a file into a byte vector.
pub fn read_to_bytes(path: &Path) -> Result<Vec<u8>> {
    debug!("Reading file to bytes: {}", path.display());
    fs::read(path).map_err(|e| {
        error!("Failed read file {}: {}", path.display(), e);
        MenuError::from(e)
    })
}

/// Sets file permissions. Mode is standard Unix octal mode.
pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    debug!("Setting permissions on {}: {:o}", path.display(), mode);
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|e| {
        error!("Failed set permissions on {}: {}", path.display(), e);
        MenuError::from(e)
    })
}

/// Atomically writes data to a file using a temporary file in the same
/// directory. Readers see either the old or the new content, never a mix.
/// Preserves original permissions if possible.
pub fn atomic_write_file(original_path: &Path, content: &[u8]) -> Result<()> {
    let dir = original_path.parent().ok_or_else(|| {
        MenuError::Generic(format!(
            "Cannot get parent directory for {}",
            original_path.display()
        ))
    })?;

    create_dir_all(dir)?;

    let original_perms = fs::metadata(original_path).map(|m| m.permissions()).ok();

    let mut temp_file = NamedTempFile::new_in(dir)?;
    let temp_path = temp_file.path().to_path_buf(); // Store path before consuming temp_file

    debug!(
        "Atomically writing {} bytes to {} via temp file {}",
        content.len(),
        original_path.display(),
        temp_path.display()
    );

    temp_file.write_all(content)?;
    temp_file.flush()?;
    temp_file.as_file().sync_all()?;

    temp_file.persist(original_path).map_err(|e| {
        error!(
            "Failed to persist/rename temporary file {} over {}: {}",
            temp_path.display(),
            original_path.display(),
            e.error
        );
        MenuError::Io(Arc::new(e.error))
    })?;

    let mode_result = match original_perms {
        Some(perms) => fs::set_permissions(original_path, perms).map_err(MenuError::from),
        // NamedTempFile creates 0600; menu shells of other users must read it
        None => set_permissions(original_path, 0o644),
    };
    if let Err(e) = mode_result {
        warn!(
            "Failed to set permissions on {}: {}",
            original_path.display(),
            e
        );
    }

    Ok(())
}

/// Writes `content` only if it differs from what is on disk.
/// Returns `true` if the file was (re)written.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool> {
    if let Ok(current) = fs::read(path) {
        if current == content {
            debug!("{} is up to date", path.display());
            return Ok(false);
        }
    }
    atomic_write_file(path, content)?;
    Ok(true)
}

/// Atomically copies `src` over `dst` (content only).
pub fn atomic_copy_file(src: &Path, dst: &Path) -> Result<()> {
    let bytes = read_to_bytes(src)?;
    atomic_write_file(dst, &bytes)
}

/// Copies every regular file directly inside `src_dir` into `dst_dir`.
/// Returns the number of files copied; a missing `src_dir` copies nothing.
pub fn copy_dir_files(src_dir: &Path, dst_dir: &Path) -> Result<usize> {
    if !src_dir.is_dir() {
        debug!("Nothing to copy, {} is not a directory", src_dir.display());
        return Ok(0);
    }
    create_dir_all(dst_dir)?;
    let mut copied = 0;
    for (name, path, is_dir) in list_directory_entries(src_dir)? {
        if is_dir {
            continue;
        }
        atomic_copy_file(&path, &dst_dir.join(&name))?;
        copied += 1;
    }
    debug!(
        "Copied {} files from {} to {}",
        copied,
        src_dir.display(),
        dst_dir.display()
    );
    Ok(copied)
}

/// Lists directory entries, returning basic info.
/// Skips entries that cause errors during reading.
pub fn list_directory_entries(
    dir_path: &Path,
) -> Result<Vec<(String, PathBuf, bool /* is_dir */)>> {
    debug!("Listing directory entries for: {}", dir_path.display());
    let mut entries = Vec::new();
    let dir_path_str = dir_path.to_string_lossy().to_string(); // For logging

    match fs::read_dir(dir_path) {
        Ok(read_dir) => {
            for entry_res in read_dir {
                match entry_res {
                    Ok(entry) => {
                        let path = entry.path();
                        let name = entry.file_name().to_string_lossy().to_string();
                        match entry.file_type() {
                            Ok(file_type) => {
                                entries.push((name, path, file_type.is_dir()));
                            }
                            Err(e) => {
                                warn!(
                                    "Failed to get file type for {} in {}: {}",
                                    path.display(),
                                    dir_path_str,
                                    e
                                );
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Error reading entry in {}: {}", dir_path_str, e);
                    }
                }
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(entries)
        }
        Err(e) => {
            error!("Failed to read directory {}: {}", dir_path.display(), e);
            Err(MenuError::from(e))
        }
    }
}

/// File names directly inside `dir_path`; empty if the directory is missing.
pub fn list_file_names(dir_path: &Path) -> Result<Vec<String>> {
    if !dir_path.is_dir() {
        return Ok(Vec::new());
    }
    Ok(list_directory_entries(dir_path)?
        .into_iter()
        .filter(|(_, _, is_dir)| !is_dir)
        .map(|(name, _, _)| name)
        .collect())
}

/// Counts files and total bytes under `path`.
pub fn count_files_and_size(path: &Path) -> (usize, u64) {
    let mut file_count = 0;
    let mut total_size = 0;
    for entry in walkdir::WalkDir::new(path) {
        match entry {
            Ok(entry_data) => {
                if entry_data.file_type().is_file() {
                    match entry_data.metadata() {
                        Ok(metadata) => {
                            file_count += 1;
                            total_size += metadata.len();
                        }
                        Err(e) => {
                            warn!(
                                "Could not get metadata for {}: {}",
                                entry_data.path().display(),
                                e
                            );
                        }
                    }
                }
            }
            Err(e) => {
                debug!("Error traversing directory {}: {}", path.display(), e);
            }
        }
    }
    (file_count, total_size)
}
