//! Unstages paths: removes their [`IndexEntry`] and, unless `keep_worktree` is set, deletes
//! the worktree file too.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, RepoError, Result};
use crate::index;
use crate::repo::Repository;

pub fn rm(repo: &Repository, paths: &[impl AsRef<Path>], keep_worktree: bool) -> Result<()> {
    rm_with(repo, paths, keep_worktree, false)
}

/// `skip_missing` makes a requested path that isn't currently staged a no-op instead of an
/// error (the core capability `commands::rm` doesn't currently expose a flag for).
pub fn rm_with(
    repo: &Repository,
    paths: &[impl AsRef<Path>],
    keep_worktree: bool,
    skip_missing: bool,
) -> Result<()> {
    let mut idx = index::read(repo)?;

    for path in paths {
        let rel = repo.rel_to_worktree(path.as_ref())?;
        let name = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");

        if !idx.remove(&name) {
            if skip_missing {
                continue;
            }
            return Err(RepoError::NameNotFound(name));
        }

        if !keep_worktree {
            let abs = repo.worktree().join(&rel);
            if abs.is_file() {
                fs::remove_file(&abs).with_path(&abs)?;
            }
        }
    }

    index::write(repo, &idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::add;
    use tempfile::tempdir;

    #[test]
    fn removes_entry_and_file() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hi\n").unwrap();
        add::add(&repo, &[&file]).unwrap();

        rm(&repo, &[&file], false).unwrap();

        assert!(!file.exists());
        assert!(index::read(&repo).unwrap().entries.is_empty());
    }

    #[test]
    fn keep_worktree_leaves_file_on_disk() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hi\n").unwrap();
        add::add(&repo, &[&file]).unwrap();

        rm(&repo, &[&file], true).unwrap();

        assert!(file.exists());
        assert!(index::read(&repo).unwrap().entries.is_empty());
    }

    #[test]
    fn fails_on_unstaged_path() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("missing.txt");
        fs::write(&file, b"hi\n").unwrap();
        let err = rm(&repo, &[&file], true).unwrap_err();
        assert!(matches!(err, RepoError::NameNotFound(_)));
    }

    #[test]
    fn skip_missing_tolerates_unstaged_path() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("missing.txt");
        fs::write(&file, b"hi\n").unwrap();
        rm_with(&repo, &[&file], true, true).unwrap();
    }
}
