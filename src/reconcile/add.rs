//! Stages paths into the index: hashes and writes a blob for each regular file, then records
//! (or updates) its [`IndexEntry`]. Directories are walked recursively. This step only ever
//! touches the index; tree construction happens separately, at commit time.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;

use ignore::WalkBuilder;

use crate::error::{IoResultExt, RepoError, Result};
use crate::index::{self, FileTime, Index, IndexEntry};
use crate::object::{write_object, GitObject};
use crate::repo::Repository;

pub fn add(repo: &Repository, paths: &[impl AsRef<Path>]) -> Result<()> {
    let mut idx = index::read(repo)?;
    for path in paths {
        stage_path(repo, &mut idx, path.as_ref())?;
    }
    index::write(repo, &idx)
}

fn stage_path(repo: &Repository, idx: &mut Index, path: &Path) -> Result<()> {
    let rel = repo.rel_to_worktree(path)?;
    let abs = repo.worktree().join(&rel);

    if abs.is_dir() {
        let walker = WalkBuilder::new(&abs).hidden(false).build();
        for entry in walker {
            let entry = entry.map_err(|e| crate::error::RepoError::io(&abs, std::io::Error::other(e)))?;
            if entry.path().starts_with(repo.gitdir()) {
                continue;
            }
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                let file_rel = repo.rel_to_worktree(entry.path())?;
                stage_file(repo, idx, &file_rel)?;
            }
        }
    } else {
        stage_file(repo, idx, &rel)?;
    }
    Ok(())
}

fn stage_file(repo: &Repository, idx: &mut Index, rel: &Path) -> Result<()> {
    let abs = repo.worktree().join(rel);
    let meta = fs::symlink_metadata(&abs).with_path(&abs)?;
    let is_symlink = meta.file_type().is_symlink();
    if !meta.is_file() && !is_symlink {
        return Err(RepoError::PathNotAFile(rel.to_path_buf()));
    }

    // A symlink's blob payload is the literal target text, never the bytes of whatever
    // it points at -- its own metadata (size, mtime, ...) governs the index entry too.
    let data = if is_symlink {
        fs::read_link(&abs)
            .with_path(&abs)?
            .to_string_lossy()
            .into_owned()
            .into_bytes()
    } else {
        fs::read(&abs).with_path(&abs)?
    };

    let hash_hex = write_object(Some(repo), &GitObject::Blob(data))?;
    let mut sha = [0u8; 20];
    hex::decode_to_slice(&hash_hex, &mut sha).expect("hash is always 40 hex chars");

    let name = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");

    let mode_type = if is_symlink {
        IndexEntry::MODE_SYMLINK
    } else {
        IndexEntry::MODE_REGULAR
    };

    let entry = IndexEntry {
        ctime: FileTime { seconds: meta.ctime() as u32, nanoseconds: meta.ctime_nsec() as u32 },
        mtime: FileTime { seconds: meta.mtime() as u32, nanoseconds: meta.mtime_nsec() as u32 },
        dev: meta.dev() as u32,
        ino: meta.ino() as u32,
        mode_type,
        mode_perms: (meta.permissions().mode() & 0o1777) as u16,
        uid: meta.uid(),
        gid: meta.gid(),
        size: meta.len() as u32,
        sha,
        flag_assume_valid: false,
        flag_stage: 0,
        name,
    };
    idx.upsert(entry);
    tracing::debug!(path = %rel.display(), hash = %hash_hex, "staged file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn stages_single_file() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"hello\n").unwrap();

        add(&repo, &[&file]).unwrap();

        let idx = index::read(&repo).unwrap();
        assert_eq!(idx.entries.len(), 1);
        assert_eq!(idx.entries[0].name, "a.txt");
    }

    #[test]
    fn stages_directory_recursively() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"b\n").unwrap();
        fs::write(dir.path().join("a.txt"), b"a\n").unwrap();

        add(&repo, &[dir.path()]).unwrap();

        let idx = index::read(&repo).unwrap();
        let mut names: Vec<_> = idx.entries.iter().map(|e| e.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub/b.txt".to_string()]);
    }

    #[test]
    fn restaging_updates_existing_entry() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, b"v1\n").unwrap();
        add(&repo, &[&file]).unwrap();

        fs::write(&file, b"v2\n").unwrap();
        add(&repo, &[&file]).unwrap();

        let idx = index::read(&repo).unwrap();
        assert_eq!(idx.entries.len(), 1);
    }
}
