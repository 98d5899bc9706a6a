//! Snapshot of resources already present in the output directory.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

/// File names (not paths) of regular files directly inside `dir`.
///
/// A missing directory is an empty snapshot.
pub fn list_local_resources(dir: &Path) -> io::Result<BTreeSet<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => return Err(e),
    };

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}
