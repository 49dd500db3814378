//! In-memory ZIP unpacking.

use super::ArchiveError;
use crate::files::{is_keepable_path, FileRecord};
use bytes::Bytes;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

/// Finds the synthetic wrapper directory shared by every entry.
///
/// Returns `None` if any entry sits at the root, or if entries disagree on
/// their first segment; paths are then used as-is.
pub(crate) fn common_prefix<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut prefix: Option<&str> = None;
    for name in names {
        let (first, _) = name.split_once('/')?;
        if first.is_empty() {
            return None;
        }
        match prefix {
            None => prefix = Some(first),
            Some(existing) if existing == first => {}
            Some(_) => return None,
        }
    }
    prefix.map(|p| format!("{p}/"))
}

/// Unpacks every keepable text file of an archive.
///
/// Runs synchronously; callers move it off the async scheduler.
pub(crate) fn extract_files(bytes: Bytes, max_file_size: u64) -> Result<Vec<FileRecord>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let prefix = common_prefix(archive.file_names().filter(|name| !name.ends_with('/')));
    debug!(entries = archive.len(), prefix = ?prefix, "Extracting archive");

    let mut files = Vec::new();
    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(index, error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let path = match &prefix {
            Some(prefix) => name.strip_prefix(prefix.as_str()).unwrap_or(&name),
            None => &name,
        };
        if path.is_empty() || !is_keepable_path(path) {
            continue;
        }
        if entry.size() > max_file_size {
            debug!(path, size = entry.size(), "Skipping large file");
            continue;
        }

        let mut buffer = Vec::new();
        if let Err(e) = (&mut entry).take(max_file_size + 1).read_to_end(&mut buffer) {
            debug!(path, error = %e, "Skipping undecompressable file");
            continue;
        }

        match FileRecord::from_bytes(path, &buffer, max_file_size) {
            Some(record) => files.push(record),
            None => debug!(path, "Skipping binary or oversized file"),
        }
    }

    Ok(files)
}
