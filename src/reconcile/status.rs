//! Status diffing: head-vs-index and index-vs-worktree comparisons, returned as structured
//! diffs rather than printed directly, so the CLI layer owns presentation.

use std::collections::BTreeMap;
use std::fs;

use ignore::WalkBuilder;

use crate::error::{IoResultExt, RepoError, Result};
use crate::ignore;
use crate::index::Index;
use crate::object::{hash_bytes, read_object, ObjectKind};
use crate::refs;
use crate::repo::Repository;
use crate::resolve;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchStatus {
    Branch(String),
    Detached(String),
}

pub fn branch_status(repo: &Repository) -> Result<BranchStatus> {
    match refs::current_branch(repo)? {
        Some(name) => Ok(BranchStatus::Branch(name)),
        None => {
            let hash = resolve::find(repo, "HEAD", None, false)?;
            Ok(BranchStatus::Detached(hash))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadIndexDiff {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

/// The path -> blob-hash mapping the current `HEAD` commit's tree describes. Empty on a
/// repository with no commits yet, rather than an error.
pub fn head_tree_dict(repo: &Repository) -> Result<BTreeMap<String, String>> {
    let head_hash = match resolve::find(repo, "HEAD", None, false) {
        Ok(hash) => hash,
        Err(RepoError::NameNotFound(_) | RepoError::RefNotFound(_)) => return Ok(BTreeMap::new()),
        Err(e) => return Err(e),
    };

    let commit = read_object(repo, &head_hash)?;
    let kvlm = commit.as_commit()?;
    let tree_hash = kvlm
        .get_one_str("tree")
        .ok_or_else(|| RepoError::MalformedObject(head_hash.clone(), "commit missing 'tree' field".into()))?;

    let mut out = BTreeMap::new();
    tree_to_dict(repo, &tree_hash, "", &mut out)?;
    Ok(out)
}

fn tree_to_dict(repo: &Repository, tree_hash: &str, prefix: &str, out: &mut BTreeMap<String, String>) -> Result<()> {
    let obj = read_object(repo, tree_hash)?;
    let tree = obj.as_tree()?;

    for leaf in &tree.leaves {
        let name = String::from_utf8_lossy(&leaf.path);
        let full_path = if prefix.is_empty() { name.into_owned() } else { format!("{prefix}/{name}") };

        if leaf.is_directory() {
            tree_to_dict(repo, &hex::encode(leaf.sha), &full_path, out)?;
        } else {
            out.insert(full_path, hex::encode(leaf.sha));
        }
    }
    Ok(())
}

pub fn head_index_diff(repo: &Repository, index: &Index) -> Result<HeadIndexDiff> {
    let mut head = head_tree_dict(repo)?;
    let mut added = Vec::new();
    let mut modified = Vec::new();

    for entry in &index.entries {
        match head.remove(&entry.name) {
            Some(head_sha) if head_sha != hex::encode(entry.sha) => modified.push(entry.name.clone()),
            Some(_) => {}
            None => added.push(entry.name.clone()),
        }
    }
    let mut deleted: Vec<String> = head.into_keys().collect();

    added.sort();
    modified.sort();
    deleted.sort();
    Ok(HeadIndexDiff { added, modified, deleted })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeDiff {
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub untracked: Vec<String>,
}

pub fn index_worktree_diff(repo: &Repository, index: &Index) -> Result<WorktreeDiff> {
    let rules = ignore::read(repo)?;

    let mut all_files: Vec<String> = Vec::new();
    let walker = WalkBuilder::new(repo.worktree()).hidden(false).build();
    for entry in walker {
        let entry = entry.map_err(|e| RepoError::io(repo.worktree(), std::io::Error::other(e)))?;
        if entry.path().starts_with(repo.gitdir()) {
            continue;
        }
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            let rel = repo.rel_to_worktree(entry.path())?;
            all_files.push(rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"));
        }
    }

    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for entry in &index.entries {
        let abs = repo.worktree().join(&entry.name);
        let meta = match fs::symlink_metadata(&abs) {
            Ok(meta) => meta,
            Err(_) => {
                deleted.push(entry.name.clone());
                continue;
            }
        };
        all_files.retain(|f| f != &entry.name);

        use std::os::unix::fs::MetadataExt;
        let ctime_ns = (meta.ctime() as i64) * 1_000_000_000 + meta.ctime_nsec() as i64;
        let mtime_ns = (meta.mtime() as i64) * 1_000_000_000 + meta.mtime_nsec() as i64;
        let recorded_ctime_ns = (entry.ctime.seconds as i64) * 1_000_000_000 + entry.ctime.nanoseconds as i64;
        let recorded_mtime_ns = (entry.mtime.seconds as i64) * 1_000_000_000 + entry.mtime.nanoseconds as i64;

        if ctime_ns != recorded_ctime_ns || mtime_ns != recorded_mtime_ns {
            let data = if meta.file_type().is_symlink() {
                fs::read_link(&abs).with_path(&abs)?.to_string_lossy().into_owned().into_bytes()
            } else {
                fs::read(&abs).with_path(&abs)?
            };
            let new_hash = hash_bytes(None, ObjectKind::Blob, data)?;
            if new_hash != hex::encode(entry.sha) {
                modified.push(entry.name.clone());
            }
        }
    }

    // files neither tracked nor ignored are untracked; ignored files are deliberately excluded
    // here (the reverse of that would surface every ignored file as "untracked").
    let mut untracked = Vec::new();
    for f in all_files {
        if !ignore::is_ignored(&rules, &f)? {
            untracked.push(f);
        }
    }
    modified.sort();
    deleted.sort();
    untracked.sort();

    Ok(WorktreeDiff { modified, deleted, untracked })
}
