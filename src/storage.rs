use crate::config::StorageConfig;
use crate::error::{Result, ShuttercamError};
use std::collections::HashSet;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Highest photo index; allocation wraps back to 1 after it
pub const MAX_PHOTO_INDEX: u16 = 9999;

/// Picks the index for the next photo file
///
/// Files are named `{prefix}{index:04}.{extension}`. The next index is one past the
/// highest index present, wrapping after 9999, and steps forward past any taken
/// slot. Gaps below the highest index are not backfilled.
///
/// A directory holding all 9999 indices never yields a free slot; the search does not
/// terminate in that case.
#[derive(Debug, Clone)]
pub struct PhotoIndexAllocator {
    prefix: String,
    extension: String,
}

impl PhotoIndexAllocator {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            prefix: config.file_prefix.clone(),
            extension: config.file_extension.clone(),
        }
    }

    /// Index encoded in `name`, if it follows the photo naming pattern
    pub fn parse_index(&self, name: &str) -> Option<u16> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        match digits.parse::<u16>() {
            Ok(index) if (1..=MAX_PHOTO_INDEX).contains(&index) => Some(index),
            _ => None,
        }
    }

    pub fn file_name(&self, index: u16) -> String {
        format!("{}{:04}.{}", self.prefix, index, self.extension)
    }

    /// Next free index given the names already in the photo directory
    pub fn next_index<I, S>(&self, existing_names: I) -> u16
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let taken: HashSet<u16> = existing_names
            .into_iter()
            .filter_map(|name| self.parse_index(name.as_ref()))
            .collect();

        let mut index = match taken.iter().max() {
            None => 1,
            Some(&max) => wrap_index(max + 1),
        };

        while taken.contains(&index) {
            index = wrap_index(index + 1);
        }

        index
    }

    /// Scan `dir` and return the next free index
    pub async fn next_index_in(&self, dir: &Path) -> Result<u16> {
        let names = list_file_names(dir).await?;
        let index = self.next_index(&names);
        debug!(
            "Scanned {} entries in {}, next photo index {}",
            names.len(),
            dir.display(),
            index
        );
        Ok(index)
    }

    /// Full path of the next photo in `dir`
    pub async fn next_photo_path(&self, dir: &Path) -> Result<PathBuf> {
        let index = self.next_index_in(dir).await?;
        Ok(dir.join(self.file_name(index)))
    }
}

fn wrap_index(index: u16) -> u16 {
    if index > MAX_PHOTO_INDEX {
        1
    } else {
        index
    }
}

async fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        ShuttercamError::component(
            "storage".to_string(),
            format!("Failed to read photo directory {}: {}", dir.display(), e),
        )
    })?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

/// Create the photo directory if needed, owned by the invoking user with mode 0755
///
/// Returns whether the directory was created. An existing directory is left untouched.
pub fn prepare_photo_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }

    std::fs::create_dir_all(path)?;

    // SAFETY: getuid/getgid have no preconditions and cannot fail
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
    std::os::unix::fs::chown(path, Some(uid), Some(gid))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;

    info!("Created photo directory {}", path.display());
    Ok(true)
}

/// Bytes available to unprivileged users on the filesystem holding `path`
pub fn free_space(path: &Path) -> Result<u64> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| ShuttercamError::system(format!("Invalid path {}", path.display())))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is NUL-terminated and stat is a valid out pointer
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
}

/// `"<n> MB"` below one gigabyte, `"<x.y> GB"` above
pub fn format_free_space(bytes: u64) -> String {
    let megabytes = bytes / (1024 * 1024);
    if megabytes < 1024 {
        format!("{} MB", megabytes)
    } else {
        format!("{:.1} GB", megabytes as f64 / 1024.0)
    }
}
