//! Reference store: reads, writes, and recursively lists textual refs under `refs/`,
//! resolving symbolic refs (`ref: …`) transitively. Ref names are paths relative to the
//! admin directory (`HEAD`, `refs/heads/master`, `refs/tags/v1`, …).

use std::collections::BTreeMap;
use std::fs;

use crate::error::{IoResultExt, RepoError, Result};
use crate::repo::Repository;

/// Bounds symbolic-ref chasing so a cycle fails cleanly instead of recursing forever.
const MAX_SYMREF_HOPS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTree {
    Hash(String),
    SubTree(BTreeMap<String, RefTree>),
}

/// Resolves `name` (e.g. `"HEAD"` or `"refs/heads/master"`) to a 40-char hex hash, following
/// symbolic refs transitively.
pub fn resolve(repo: &Repository, name: &str) -> Result<String> {
    resolve_hops(repo, name, 0)
}

fn resolve_hops(repo: &Repository, name: &str, hops: usize) -> Result<String> {
    if hops >= MAX_SYMREF_HOPS {
        return Err(RepoError::RefMalformed(
            name.to_string(),
            "symbolic ref chain too deep (possible cycle)".into(),
        ));
    }

    let path = repo.gitdir().join(name);
    if !path.is_file() {
        return Err(RepoError::RefNotFound(name.to_string()));
    }

    let data = fs::read_to_string(&path).with_path(&path)?;
    let trimmed = data.trim_end_matches('\n');

    if let Some(target) = trimmed.strip_prefix("ref: ") {
        resolve_hops(repo, target.trim(), hops + 1)
    } else if trimmed.len() == 40 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(trimmed.to_lowercase())
    } else {
        Err(RepoError::RefMalformed(
            name.to_string(),
            "expected a 40-char hex hash or 'ref: <name>'".into(),
        ))
    }
}

/// Writes `refs/<name>` (or any ref path) with `<hash>\n`, creating parent directories.
/// Always truncates the destination; a partial write must never leave a corrupt ref behind.
pub fn create(repo: &Repository, name: &str, hash_hex: &str) -> Result<()> {
    let path = repo.gitdir().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    fs::write(&path, format!("{hash_hex}\n")).with_path(&path)?;
    tracing::debug!(name, hash = hash_hex, "wrote ref");
    Ok(())
}

/// Writes a symbolic ref: `HEAD` containing `ref: refs/heads/<branch>\n`.
pub fn create_symbolic(repo: &Repository, name: &str, target: &str) -> Result<()> {
    let path = repo.gitdir().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }
    fs::write(&path, format!("ref: {target}\n")).with_path(&path)?;
    Ok(())
}

/// Recursively lists every ref under `under` (e.g. `"refs"`), building a tree keyed by the
/// path component at each level.
pub fn list(repo: &Repository, under: &str) -> Result<BTreeMap<String, RefTree>> {
    let root = repo.gitdir().join(under);
    list_dir(repo, &root)
}

fn list_dir(repo: &Repository, dir: &std::path::Path) -> Result<BTreeMap<String, RefTree>> {
    let mut out = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }

    let mut entries: Vec<_> = fs::read_dir(dir).with_path(dir)?.collect::<std::io::Result<_>>().with_path(dir)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            out.insert(name, RefTree::SubTree(list_dir(repo, &path)?));
        } else {
            let rel = path
                .strip_prefix(repo.gitdir())
                .expect("entries under gitdir always have gitdir as a prefix")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            out.insert(name, RefTree::Hash(resolve(repo, &rel)?));
        }
    }

    Ok(out)
}

/// The branch name HEAD points to, if it is a symbolic ref (`None` when HEAD is detached).
pub fn current_branch(repo: &Repository) -> Result<Option<String>> {
    let head_path = repo.gitdir().join("HEAD");
    let data = fs::read_to_string(&head_path).with_path(&head_path)?;
    let trimmed = data.trim_end_matches('\n');
    Ok(trimmed
        .strip_prefix("ref: refs/heads/")
        .map(|b| b.to_string()))
}

/// Points HEAD at `hash_hex`: updates `refs/heads/<branch>` when HEAD is symbolic, otherwise
/// overwrites HEAD directly (detached HEAD).
pub fn update_head(repo: &Repository, hash_hex: &str) -> Result<()> {
    match current_branch(repo)? {
        Some(branch) => create(repo, &format!("refs/heads/{branch}"), hash_hex),
        None => create(repo, "HEAD", hash_hex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolves_direct_hash() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        create(&repo, "refs/heads/master", "a".repeat(40).as_str()).unwrap();
        assert_eq!(resolve(&repo, "refs/heads/master").unwrap(), "a".repeat(40));
    }

    #[test]
    fn resolves_symbolic_head() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        create(&repo, "refs/heads/master", "b".repeat(40).as_str()).unwrap();
        assert_eq!(resolve(&repo, "HEAD").unwrap(), "b".repeat(40));
    }

    #[test]
    fn detects_symref_cycle() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        create_symbolic(&repo, "refs/heads/a", "refs/heads/b").unwrap();
        create_symbolic(&repo, "refs/heads/b", "refs/heads/a").unwrap();
        let err = resolve(&repo, "refs/heads/a").unwrap_err();
        assert!(matches!(err, RepoError::RefMalformed(_, _)));
    }

    #[test]
    fn update_head_follows_symbolic_branch() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        update_head(&repo, "c".repeat(40).as_str()).unwrap();
        assert_eq!(resolve(&repo, "refs/heads/master").unwrap(), "c".repeat(40));
    }

    #[test]
    fn list_builds_tree() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        create(&repo, "refs/heads/master", "d".repeat(40).as_str()).unwrap();
        create(&repo, "refs/tags/v1", "e".repeat(40).as_str()).unwrap();

        let tree = list(&repo, "refs").unwrap();
        assert!(matches!(tree.get("heads"), Some(RefTree::SubTree(_))));
        assert!(matches!(tree.get("tags"), Some(RefTree::SubTree(_))));
    }
}
