use std::path::Path;

use crate::error::Result;
use crate::repo::Repository;

/// `init <path>`.
pub fn run(path: &Path) -> Result<()> {
    let repo = Repository::init(path)?;
    println!("Initialized empty repository in {}", repo.gitdir().display());
    Ok(())
}
