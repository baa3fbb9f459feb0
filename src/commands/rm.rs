use std::path::Path;

use crate::error::Result;
use crate::reconcile::rm;
use crate::repo::Repository;

/// `rm <path>...`; `--cached` keeps the worktree file and only unstages it.
pub fn run(paths: &[impl AsRef<Path>], cached: bool) -> Result<()> {
    let repo = Repository::discover(".")?;
    rm::rm(&repo, paths, cached)
}
