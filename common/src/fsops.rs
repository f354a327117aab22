//! Filesystem mutation primitives: copy, link, move and remove.
//!
//! Each operation that writes a destination first creates the destination's
//! parent directory, so callers never need to prepare the layout themselves.
//! None of these functions change ownership or permission bits beyond what
//! the operating system applies by default.

use crate::error::{FsError, Result};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Copies a file's content to `destination`.
///
/// When `destination` is an existing directory, the file is copied into it
/// under its own file name. Returns the path that was written.
///
/// # Errors
///
/// Returns [`FsError::NotFound`] when `source` does not exist and
/// [`FsError::Filesystem`] for any other I/O failure.
///
/// # Examples
///
/// ```no_run
/// use provision_common::fsops::copy;
/// use std::path::Path;
///
/// let written = copy(Path::new("/tmp/standalone.xml"), Path::new("/opt/eap/conf/"))?;
/// assert!(written.ends_with("standalone.xml"));
/// # Ok::<(), provision_common::FsError>(())
/// ```
pub fn copy(source: &Path, destination: &Path) -> Result<PathBuf> {
    let target = match (destination.is_dir(), source.file_name()) {
        (true, Some(name)) => destination.join(name),
        _ => destination.to_path_buf(),
    };
    ensure_parent(&target)?;
    debug!("copy {} -> {}", source.display(), target.display());
    fs::copy(source, &target).map_err(|e| copy_error(source, &target, e))?;
    Ok(target)
}

/// Creates a symbolic link at `destination` pointing to `source`.
///
/// # Errors
///
/// Returns [`FsError::Filesystem`] when `destination` already exists or the
/// link cannot be created.
pub fn link(source: &Path, destination: &Path) -> Result<()> {
    ensure_parent(destination)?;
    debug!("link {} -> {}", destination.display(), source.display());
    std::os::unix::fs::symlink(source, destination)
        .map_err(|e| FsError::io("link", destination, e))
}

/// Moves `source` to `destination`.
///
/// Within one filesystem this is a rename. When the rename crosses devices
/// the tree is copied (preserving permission bits and symlinks) and the
/// source removed afterwards.
///
/// # Errors
///
/// Returns [`FsError::NotFound`] when `source` does not exist and
/// [`FsError::Filesystem`] when the rename or the fallback copy fails.
pub fn move_path(source: &Path, destination: &Path) -> Result<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(FsError::NotFound {
            path: source.to_path_buf(),
        });
    }
    ensure_parent(destination)?;
    debug!("move {} -> {}", source.display(), destination.display());

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("rename crossed devices; copying {}", source.display());
            copy_tree(source, destination).map_err(|e| FsError::io("move", destination, e))?;
            remove(source)
        }
        Err(e) => Err(FsError::io("move", source, e)),
    }
}

/// Removes `path`: recursively for a directory, a single unlink otherwise.
///
/// Symbolic links are removed themselves and never followed.
///
/// # Errors
///
/// Returns [`FsError::NotFound`] when `path` does not exist.
pub fn remove(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| FsError::io("remove", path, e))?;
    debug!("remove {}", path.display());
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .map_err(|e| FsError::io("remove", path, e))
}

/// Creates the parent directory of `path` if it is missing.
fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| FsError::io("create directory", parent, e))
        }
        _ => Ok(()),
    }
}

fn copy_error(source: &Path, target: &Path, error: io::Error) -> FsError {
    if source.exists() {
        FsError::io("copy", target, error)
    } else {
        FsError::NotFound {
            path: source.to_path_buf(),
        }
    }
}

/// Copies a file, symlink or directory tree to `dst`.
fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(src)?;
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(src)?;
        return std::os::unix::fs::symlink(target, dst);
    }
    if metadata.is_file() {
        return fs::copy(src, dst).map(|_| ());
    }

    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copy_tree(&entry.path(), &dst.join(entry.file_name()))?;
    }
    fs::set_permissions(dst, metadata.permissions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_DATA: &str = "Test Data 123";

    fn temp_with_file() -> (TempDir, PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let file = temp.path().join("testfile");
        fs::write(&file, TEST_DATA).expect("write test file");
        (temp, file)
    }

    fn assert_test_data(path: &Path) {
        assert_eq!(fs::read_to_string(path).expect("read back"), TEST_DATA);
    }

    #[test]
    fn copy_round_trips_content() {
        let (temp, file) = temp_with_file();
        let dest = temp.path().join("dest");

        let written = copy(&file, &dest).expect("copy");

        assert_eq!(written, dest);
        assert_test_data(&dest);
        assert_test_data(&file);
    }

    #[test]
    fn copy_creates_missing_parents() {
        let (temp, file) = temp_with_file();
        let dest = temp.path().join("a/b/c/dest");

        copy(&file, &dest).expect("copy");

        assert_test_data(&dest);
    }

    #[test]
    fn copy_into_existing_directory_keeps_file_name() {
        let (temp, file) = temp_with_file();
        let dir = temp.path().join("conf");
        fs::create_dir(&dir).expect("mkdir");

        let written = copy(&file, &dir).expect("copy");

        assert_eq!(written, dir.join("testfile"));
        assert_test_data(&written);
    }

    #[test]
    fn copy_missing_source_is_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let err = copy(&temp.path().join("absent"), &temp.path().join("dest"))
            .expect_err("copy should fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn link_points_at_source() {
        let (temp, file) = temp_with_file();
        let dest = temp.path().join("links/destlink");

        link(&file, &dest).expect("link");

        assert!(dest.is_symlink());
        assert_eq!(fs::read_link(&dest).expect("read link"), file);
        assert_test_data(&dest);
    }

    #[test]
    fn link_refuses_existing_destination() {
        let (temp, file) = temp_with_file();
        let dest = temp.path().join("occupied");
        fs::write(&dest, "x").expect("write");

        let err = link(&file, &dest).expect_err("link should fail");

        assert!(matches!(err, FsError::Filesystem { operation: "link", .. }));
    }

    #[test]
    fn move_relocates_file() {
        let (temp, file) = temp_with_file();
        let tmp = temp.path().join("tmpdest");
        let last = temp.path().join("nested/finaldest");
        copy(&file, &tmp).expect("copy");

        move_path(&tmp, &last).expect("move");

        assert!(!tmp.exists());
        assert_test_data(&last);
    }

    #[test]
    fn move_relocates_directory_tree() {
        let temp = TempDir::new().expect("temp dir");
        let src = temp.path().join("jboss-eap-7.0");
        fs::create_dir_all(src.join("bin")).expect("mkdir");
        fs::write(src.join("bin/standalone.sh"), TEST_DATA).expect("write");
        let dest = temp.path().join("opt/eap");

        move_path(&src, &dest).expect("move");

        assert!(!src.exists());
        assert_test_data(&dest.join("bin/standalone.sh"));
    }

    #[test]
    fn move_missing_source_is_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let err = move_path(&temp.path().join("absent"), &temp.path().join("dest"))
            .expect_err("move should fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn copy_tree_preserves_layout_and_links() {
        let temp = TempDir::new().expect("temp dir");
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("modules/system")).expect("mkdir");
        fs::write(src.join("modules/system/module.xml"), TEST_DATA).expect("write");
        std::os::unix::fs::symlink("modules", src.join("mods")).expect("symlink");
        let dst = temp.path().join("dst");

        copy_tree(&src, &dst).expect("copy tree");

        assert_test_data(&dst.join("modules/system/module.xml"));
        assert_eq!(
            fs::read_link(dst.join("mods")).expect("read link"),
            PathBuf::from("modules")
        );
    }

    #[test]
    fn remove_deletes_file() {
        let (temp, file) = temp_with_file();
        let tmp = temp.path().join("rmdest");
        copy(&file, &tmp).expect("copy");

        remove(&tmp).expect("remove");

        assert!(!tmp.exists());
    }

    #[test]
    fn remove_deletes_directory_recursively() {
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join("rmdest");
        fs::create_dir_all(dir.join("sub")).expect("mkdir");
        fs::write(dir.join("sub/file"), TEST_DATA).expect("write");

        remove(&dir).expect("remove");

        assert!(!dir.exists());
    }

    #[test]
    fn remove_unlinks_symlink_without_following() {
        let (temp, file) = temp_with_file();
        let link_path = temp.path().join("link");
        link(&file, &link_path).expect("link");

        remove(&link_path).expect("remove");

        assert!(!link_path.is_symlink());
        assert_test_data(&file);
    }

    #[test]
    fn remove_missing_path_is_not_found() {
        let temp = TempDir::new().expect("temp dir");
        let err = remove(&temp.path().join("absent")).expect_err("remove should fail");
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
