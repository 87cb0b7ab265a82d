//! Path Resolution
//!
//! Navigation over the staged tree with boundary enforcement. The resolver
//! owns the staging root; virtual paths can never name anything above it.

use std::path::{Path, PathBuf};

use crate::errors::ResolveError;
use crate::vpath::VirtualPath;

#[derive(Debug)]
pub struct Resolver {
    staging_root: PathBuf,
}

impl Resolver {
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Resolver {
            staging_root: staging_root.into(),
        }
    }

    /// Map a virtual path onto the staging tree.
    fn on_disk(&self, path: &VirtualPath) -> PathBuf {
        let mut disk = self.staging_root.clone();
        for segment in path.segments() {
            disk.push(segment);
        }
        disk
    }

    /// One level up. At the root this is a boundary violation; the caller
    /// keeps its current path.
    pub fn ascend(&self, current: &VirtualPath) -> Result<VirtualPath, ResolveError> {
        if current.is_root() {
            return Err(ResolveError::BoundaryViolation);
        }
        let mut next = current.clone();
        next.pop();
        Ok(next)
    }

    /// Resolve a cd argument against the current path.
    ///
    /// The argument may hold several segments. A `..` segment pops a level
    /// and popping past the root is a boundary violation; every other
    /// segment is applied literally. The result must name an existing
    /// directory in the staged tree.
    pub fn descend(&self, current: &VirtualPath, arg: &str) -> Result<VirtualPath, ResolveError> {
        let mut next = current.clone();
        for segment in arg.split('/') {
            if segment.is_empty() {
                continue;
            }
            if segment == ".." {
                if !next.pop() {
                    return Err(ResolveError::BoundaryViolation);
                }
                continue;
            }
            next.push(segment);
        }
        if !self.on_disk(&next).is_dir() {
            return Err(ResolveError::NotFound {
                path: arg.to_string(),
            });
        }
        Ok(next)
    }

    /// List entry names at the path, sorted.
    pub fn read_dir(&self, path: &VirtualPath) -> Result<Vec<String>, ResolveError> {
        let disk = self.on_disk(path);
        let reader = std::fs::read_dir(&disk).map_err(|_| ResolveError::NotFound {
            path: path.to_string(),
        })?;
        let mut names = Vec::new();
        for entry in reader.flatten() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Recursive byte total of all files under the path. Symlinks are not
    /// followed.
    pub fn disk_usage(&self, path: &VirtualPath) -> Result<u64, ResolveError> {
        let disk = self.on_disk(path);
        if !disk.is_dir() {
            return Err(ResolveError::NotFound {
                path: path.to_string(),
            });
        }
        Ok(directory_size(&disk))
    }
}

fn directory_size(dir: &Path) -> u64 {
    let reader = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(_) => return 0,
    };
    let mut total = 0;
    for entry in reader.flatten() {
        let entry_path = entry.path();
        let meta = match std::fs::symlink_metadata(&entry_path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if meta.is_dir() {
            total += directory_size(&entry_path);
        } else if meta.is_file() {
            total += meta.len();
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_tree() -> (tempfile::TempDir, Resolver) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        std::fs::create_dir_all(root.join("dir1/sub")).unwrap();
        std::fs::create_dir_all(root.join("dir2")).unwrap();
        std::fs::write(root.join("dir1/file1.txt"), "Hello, World!").unwrap();
        std::fs::write(root.join("dir1/file2.txt"), "Test file").unwrap();
        std::fs::write(root.join("dir2/file3.txt"), "x".repeat(55)).unwrap();
        let resolver = Resolver::new(&root);
        (dir, resolver)
    }

    #[test]
    fn test_ascend_at_root_is_boundary_violation() {
        let (_dir, resolver) = staged_tree();
        let err = resolver.ascend(&VirtualPath::root()).unwrap_err();
        assert!(matches!(err, ResolveError::BoundaryViolation));
    }

    #[test]
    fn test_descend_then_ascend_round_trip() {
        let (_dir, resolver) = staged_tree();
        let root = VirtualPath::root();

        let inside = resolver.descend(&root, "dir1").unwrap();
        assert_eq!(inside.to_string(), "/dir1");
        let back = resolver.ascend(&inside).unwrap();
        assert_eq!(back, root);
    }

    #[test]
    fn test_descend_missing_is_not_found() {
        let (_dir, resolver) = staged_tree();
        let err = resolver.descend(&VirtualPath::root(), "missing").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn test_descend_multi_segment_argument() {
        let (_dir, resolver) = staged_tree();
        let path = resolver.descend(&VirtualPath::root(), "dir1/sub").unwrap();
        assert_eq!(path.to_string(), "/dir1/sub");

        // One ascend per level on the way back.
        let up = resolver.ascend(&path).unwrap();
        assert_eq!(up.to_string(), "/dir1");
        let top = resolver.ascend(&up).unwrap();
        assert!(top.is_root());
    }

    #[test]
    fn test_descend_parent_segments_cannot_escape() {
        let (_dir, resolver) = staged_tree();
        let err = resolver
            .descend(&VirtualPath::root(), "dir1/../..")
            .unwrap_err();
        assert!(matches!(err, ResolveError::BoundaryViolation));
    }

    #[test]
    fn test_descend_parent_segment_inside_argument() {
        let (_dir, resolver) = staged_tree();
        let path = resolver
            .descend(&VirtualPath::root(), "dir1/../dir2")
            .unwrap();
        assert_eq!(path.to_string(), "/dir2");
    }

    #[test]
    fn test_descend_dot_is_not_special() {
        let (_dir, resolver) = staged_tree();
        // The staged directory always contains itself under ".", so the
        // literal segment descends in place.
        let path = resolver.descend(&VirtualPath::root(), ".").unwrap();
        assert_eq!(path.to_string(), "/.");
    }

    #[test]
    fn test_read_dir_lists_sorted_names() {
        let (_dir, resolver) = staged_tree();
        let names = resolver.read_dir(&VirtualPath::root()).unwrap();
        assert_eq!(names, vec!["dir1", "dir2"]);
    }

    #[test]
    fn test_read_dir_missing_directory() {
        let (_dir, resolver) = staged_tree();
        let mut ghost = VirtualPath::root();
        ghost.push("missing");
        assert!(matches!(
            resolver.read_dir(&ghost),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn test_disk_usage_sums_all_files() {
        let (_dir, resolver) = staged_tree();
        assert_eq!(resolver.disk_usage(&VirtualPath::root()).unwrap(), 77);

        let dir1 = resolver.descend(&VirtualPath::root(), "dir1").unwrap();
        assert_eq!(resolver.disk_usage(&dir1).unwrap(), 22);
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_usage_does_not_follow_symlinks() {
        let (dir, resolver) = staged_tree();
        let root = dir.path().join("staging");
        std::os::unix::fs::symlink(root.join("dir2/file3.txt"), root.join("dir1/link"))
            .unwrap();

        let dir1 = resolver.descend(&VirtualPath::root(), "dir1").unwrap();
        assert_eq!(resolver.disk_usage(&dir1).unwrap(), 22);
    }
}
