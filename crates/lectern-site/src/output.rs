//! Writing generated files into the output tree.
//!
//! Every file is first written to a uniquely named temporary file next to its
//! destination and then persisted over it, so an interrupted run never leaves
//! a truncated page or asset behind.

use std::fs::{self, File, Permissions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::{NamedTempFile, TempDir};

const TEMP_PREFIX: &str = ".lectern-";

fn temp_sibling(path: &Path) -> io::Result<NamedTempFile> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(parent)
}

/// Mode for new generated files. Temporary files start out private.
#[cfg(unix)]
fn default_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_file_permissions() -> Option<Permissions> {
    None
}

/// Mode for a newly created output root.
#[cfg(unix)]
fn default_dir_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn default_dir_permissions() -> Option<Permissions> {
    None
}

/// Write `contents` to `path`, replacing any existing file. An existing
/// file's permissions are kept.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp = temp_sibling(path)?;
    temp.write_all(contents)?;

    let permissions = match fs::metadata(path) {
        Ok(existing) => Some(existing.permissions()),
        Err(_) => default_file_permissions(),
    };
    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Copy `from` to `to` byte-for-byte with `from`'s permissions, replacing
/// any existing file.
pub fn copy_atomic(from: &Path, to: &Path) -> io::Result<u64> {
    let mut source = File::open(from)?;
    let permissions = source.metadata()?.permissions();

    let mut temp = temp_sibling(to)?;
    let bytes = io::copy(&mut source, &mut temp)?;
    temp.as_file().set_permissions(permissions)?;

    temp.persist(to).map_err(|e| e.error)?;
    Ok(bytes)
}

/// A scratch output directory that replaces the real output root only when
/// committed. Dropping it uncommitted removes everything written to it.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    /// Create a staging directory next to `output_root`.
    pub fn new(output_root: &Path) -> io::Result<Self> {
        let parent = output_parent(output_root)?;
        fs::create_dir_all(parent)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!(".{}.staging-", output_name(output_root)))
            .tempdir_in(parent)?;

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Replace `output_root` with the staged tree.
    ///
    /// The previous output is moved aside first and put back if the staged
    /// tree cannot be moved into place. The new root takes the previous
    /// root's permissions, or `0o755` when there was none.
    pub fn commit(self, output_root: &Path) -> io::Result<()> {
        let previous = match fs::symlink_metadata(output_root) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        if let Some(permissions) = previous.clone().or_else(default_dir_permissions) {
            fs::set_permissions(self.dir.path(), permissions)?;
        }

        if previous.is_none() {
            fs::rename(self.dir.path(), output_root)?;
            let _ = self.dir.keep();
            return Ok(());
        }

        // Dropping the backup directory removes the old tree
        let backup = tempfile::Builder::new()
            .prefix(&format!(".{}.previous-", output_name(output_root)))
            .tempdir_in(output_parent(output_root)?)?;
        let moved = backup.path().join("output");

        fs::rename(output_root, &moved)?;

        if let Err(e) = fs::rename(self.dir.path(), output_root) {
            if fs::rename(&moved, output_root).is_err() {
                let kept = backup.keep().join("output");
                tracing::warn!("Previous output left at {}", kept.display());
            }
            return Err(e);
        }
        let _ = self.dir.keep();

        backup.close()
    }
}

fn output_parent(output_root: &Path) -> io::Result<&Path> {
    output_root.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "output directory has no parent directory",
        )
    })
}

fn output_name(output_root: &Path) -> String {
    output_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
