//! Commit construction: builds a commit object referencing a tree and a parent, stamps
//! author/committer with a POSIX timestamp and numeric timezone, and updates the current
//! branch ref (or detached HEAD).

use chrono::Local;

use crate::config;
use crate::error::Result;
use crate::index;
use crate::object::{write_object, GitObject, Kvlm};
use crate::reconcile::tree_builder;
use crate::refs;
use crate::repo::Repository;
use crate::resolve;

/// Builds a tree from the current index, creates a commit on top of the current `HEAD` (if
/// any), and advances the current branch (or detached HEAD) to it. Returns the new hash.
pub fn commit(repo: &Repository, message: &str) -> Result<String> {
    let idx = index::read(repo)?;
    let tree_hash = tree_builder::build(repo, &idx)?;
    let parent = resolve::find(repo, "HEAD", None, false).ok();

    let (name, email) = config::resolve_identity(repo.config())?;
    let id_stamp = stamp(&name, &email);

    let mut kvlm = Kvlm::new();
    kvlm.push("tree", tree_hash.as_bytes().to_vec());
    if let Some(parent_hash) = &parent {
        kvlm.push("parent", parent_hash.as_bytes().to_vec());
    }
    kvlm.push("author", id_stamp.as_bytes().to_vec());
    kvlm.push("committer", id_stamp.as_bytes().to_vec());
    kvlm.message = trailing_newline(message);

    let hash = write_object(Some(repo), &GitObject::Commit(kvlm))?;
    refs::update_head(repo, &hash)?;
    tracing::debug!(hash = %hash, tree = %tree_hash, parent = ?parent, "created commit");
    Ok(hash)
}

/// `Name <email> <unix-seconds> <±HHMM>`, the shared author/committer/tagger stamp format,
/// derived from the local zone offset.
pub(crate) fn stamp(name: &str, email: &str) -> String {
    let now = Local::now();
    let offset = now.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let hours = offset.abs() / 3600;
    let minutes = (offset.abs() % 3600) / 60;
    format!("{name} <{email}> {} {sign}{hours:02}{minutes:02}", now.timestamp())
}

pub(crate) fn trailing_newline(message: &str) -> Vec<u8> {
    let mut bytes = message.as_bytes().to_vec();
    if !bytes.ends_with(b"\n") {
        bytes.push(b'\n');
    }
    bytes
}
