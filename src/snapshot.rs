//! Mirror a node tree to disk, and read it back.
//!
//! Useful for attaching the state of every device to a bug report. The
//! exported files hold whatever each node rendered at export time.
use crate::{error::SnapshotError, vfs::Filesystem};
use log::{debug, warn};
use std::{collections::BTreeMap, fs, path::Path};
use walkdir::WalkDir;

pub type Result<T, E = SnapshotError> = std::result::Result<T, E>;

/// Write every readable file of `fs` below `dest`.
///
/// Directories are created as needed. Nodes that fail to read, such as those
/// of a device that's going away, are skipped.
///
/// Returns the number of files written.
pub fn export(fs: &Filesystem, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest)?;
    let mut written = 0;
    for (path, node) in fs.walk() {
        let target = dest.join(&path);
        if node.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        match node.read() {
            Ok(data) => {
                fs::write(&target, data)?;
                written += 1;
            }
            Err(e) => warn!("{}: skipping `{}`: {e}", fs.name(), path.display()),
        }
    }
    debug!("{}: exported {written} files to `{}`", fs.name(), dest.display());
    Ok(written)
}

/// Read every file below `dir`.
///
/// Keys are paths relative to `dir`, separated by `/`.
pub fn load(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        map.insert(key, fs::read_to_string(entry.path())?);
    }
    Ok(map)
}
