//! Filesystem infrastructure: persists sandbox artifacts on the host.
//!
//! Artifacts returned by a provider live in scratch directories that vanish
//! with the last artifact handle; these helpers copy them somewhere durable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::{DirectoryArtifact, FileArtifact};

/// Copies `file` into `out_dir`, keeping its name. Returns the new path.
///
/// # Errors
///
/// Returns an error if `out_dir` cannot be created or the copy fails.
pub fn persist_file(file: &FileArtifact, out_dir: &Path) -> Result<PathBuf> {
    let name = file
        .path()
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("artifact {} has no file name", file.path().display()))?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;
    let dest = out_dir.join(name);
    std::fs::copy(file.path(), &dest)
        .with_context(|| format!("cannot write {}", dest.display()))?;
    Ok(dest)
}

/// Copies the contents of `dir` into `dest`, creating it when needed.
/// Existing files with the same relative path are overwritten.
///
/// # Errors
///
/// Returns an error if any entry cannot be read or written.
pub fn persist_directory(dir: &DirectoryArtifact, dest: &Path) -> Result<PathBuf> {
    copy_tree(dir.path(), dest)?;
    Ok(dest.to_path_buf())
}

/// Replaces `dest` with the contents of `dir`.
///
/// The tree is staged in a sibling directory and renamed into place, so
/// read-only files in the old tree (git objects) never need overwriting and
/// entries missing from `dir` do not survive. On failure `dest` is left as
/// it was.
///
/// # Errors
///
/// Returns an error if staging or either rename fails.
pub fn replace_directory(dir: &DirectoryArtifact, dest: &Path) -> Result<PathBuf> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("cannot create {}", parent.display()))?;
    let staging = tempfile::Builder::new()
        .prefix(".ferry-")
        .tempdir_in(&parent)
        .with_context(|| format!("cannot stage next to {}", dest.display()))?;
    let staged = staging.path().join("next");
    copy_tree(dir.path(), &staged)?;

    if dest.exists() {
        let previous = staging.path().join("previous");
        std::fs::rename(dest, &previous)
            .with_context(|| format!("cannot move {} aside", dest.display()))?;
        if let Err(e) = std::fs::rename(&staged, dest) {
            let _ = std::fs::rename(&previous, dest);
            return Err(e).with_context(|| format!("cannot replace {}", dest.display()));
        }
    } else {
        std::fs::rename(&staged, dest)
            .with_context(|| format!("cannot write {}", dest.display()))?;
    }
    // Dropping `staging` removes the previous tree.
    Ok(dest.to_path_buf())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).with_context(|| format!("cannot create {}", dest.display()))?;
    for entry in std::fs::read_dir(src).with_context(|| format!("cannot read {}", src.display()))? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        let kind = entry.file_type()?;
        if kind.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else if kind.is_symlink() {
            let link = std::fs::read_link(entry.path())?;
            #[cfg(unix)]
            {
                let _ = std::fs::remove_file(&target);
                std::os::unix::fs::symlink(&link, &target)
                    .with_context(|| format!("cannot link {}", target.display()))?;
            }
            #[cfg(not(unix))]
            {
                let _ = link;
            }
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("cannot write {}", target.display()))?;
        }
    }
    Ok(())
}
