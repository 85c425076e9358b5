// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path manipulation utilities.
//!
//! Copy and clear directory trees that the deploy and version tools need to
//! shuffle around, e.g., build output into the workspace, or the current
//! documentation tree into a snapshot.

use ignore::WalkBuilder;
use std::{
    ffi::OsStr,
    fs::{copy, read_dir, remove_dir_all, remove_file},
    path::{Path, PathBuf},
};
use tracing::debug;

/// Recursively copy contents of `src` into `dst`.
///
/// Directory `dst` is created if missing. Hidden files and ignore rules are
/// not special, everything gets copied. Returns number of files copied.
///
/// # Errors
///
/// - Return [`PathError::Walk`] if `src` cannot be traversed.
/// - Return [`PathError::CreateDir`] if a target directory cannot be made.
/// - Return [`PathError::Copy`] if a file cannot be copied.
pub fn copy_tree(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<u64> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    create_dir(dst)?;

    let mut copied = 0;
    let walker = WalkBuilder::new(src).standard_filters(false).build();
    for entry in walker {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) if relative.as_os_str().is_empty() => continue,
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_some_and(|kind| kind.is_dir()) {
            create_dir(&target)?;
        } else {
            copy(entry.path(), &target).map_err(|source| PathError::Copy {
                source,
                from: entry.path().to_path_buf(),
                to: target.clone(),
            })?;
            copied += 1;
        }
    }

    debug!("copied {copied} files from {:?} to {:?}", src.display(), dst.display());
    Ok(copied)
}

/// Remove every top-level entry of `dir` except the one named `keep`.
///
/// # Errors
///
/// - Return [`PathError::Remove`] if any entry cannot be removed.
pub fn clear_dir_except(dir: impl AsRef<Path>, keep: impl AsRef<OsStr>) -> Result<()> {
    let dir = dir.as_ref();
    let entries = read_dir(dir).map_err(|source| PathError::Remove {
        source,
        path: dir.to_path_buf(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PathError::Remove {
            source,
            path: dir.to_path_buf(),
        })?;

        if entry.file_name().as_os_str() == keep.as_ref() {
            continue;
        }

        remove_path(entry.path())?;
    }

    Ok(())
}

/// Remove file or directory tree at `path` if it exists.
///
/// Returns whether anything was removed.
///
/// # Errors
///
/// - Return [`PathError::Remove`] if path cannot be removed.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.symlink_metadata().is_err() {
        return Ok(false);
    }

    remove_path(path)?;
    Ok(true)
}

fn remove_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let result = if path.is_dir() && !path.is_symlink() {
        remove_dir_all(path)
    } else {
        remove_file(path)
    };

    result.map_err(|source| PathError::Remove {
        source,
        path: path.to_path_buf(),
    })
}

/// Create directory at `path` along with any missing parents.
///
/// # Errors
///
/// - Return [`PathError::CreateDir`] if directory cannot be created.
pub fn create_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    mkdirp::mkdirp(path).map_err(|source| PathError::CreateDir {
        source,
        path: path.to_path_buf(),
    })?;

    Ok(())
}

/// Path manipulation error types.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Directory tree cannot be traversed.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be copied.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// File or directory cannot be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = PathError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, read_to_string, write};
    use tempfile::TempDir;

    #[test]
    fn copy_tree_copies_nested_and_hidden_files() -> anyhow::Result<()> {
        let src = TempDir::new()?;
        let dst = TempDir::new()?;
        create_dir_all(src.path().join("assets/js"))?;
        write(src.path().join("index.html"), "<html></html>")?;
        write(src.path().join(".nojekyll"), "")?;
        write(src.path().join("assets/js/main.js"), "let x = 1;")?;

        let target = dst.path().join("out");
        let copied = copy_tree(src.path(), &target)?;

        assert_eq!(copied, 3);
        assert_eq!(read_to_string(target.join("index.html"))?, "<html></html>");
        assert_eq!(read_to_string(target.join("assets/js/main.js"))?, "let x = 1;");
        assert!(target.join(".nojekyll").exists());

        Ok(())
    }

    #[test]
    fn clear_dir_except_keeps_named_entry() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        create_dir_all(dir.path().join(".git/objects"))?;
        create_dir_all(dir.path().join("old/nested"))?;
        write(dir.path().join("index.html"), "stale")?;
        write(dir.path().join("old/nested/page.html"), "stale")?;

        clear_dir_except(dir.path(), ".git")?;

        let mut remaining = read_dir(dir.path())?
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect::<Result<Vec<_>, _>>()?;
        remaining.sort();
        assert_eq!(remaining, vec![std::ffi::OsString::from(".git")]);
        assert!(dir.path().join(".git/objects").exists());

        Ok(())
    }

    #[test]
    fn remove_if_exists_reports_removal() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("workspace");
        create_dir_all(target.join("sub"))?;

        assert!(remove_if_exists(&target)?);
        assert!(!target.exists());
        assert!(!remove_if_exists(&target)?);

        Ok(())
    }
}
