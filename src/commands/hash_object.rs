use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::object::{hash_bytes, ObjectKind};
use crate::repo::Repository;

/// `hash-object [-w] -t <type> <path>`.
pub fn run(write: bool, kind: ObjectKind, path: &Path) -> Result<()> {
    let data = fs::read(path).with_path(path)?;
    let repo = if write { Some(Repository::discover(".")?) } else { None };
    let hash = hash_bytes(repo.as_ref(), kind, data)?;
    println!("{hash}");
    Ok(())
}
