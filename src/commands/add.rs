use std::path::Path;

use crate::error::Result;
use crate::reconcile::add;
use crate::repo::Repository;

/// `add <path>...`.
pub fn run(paths: &[impl AsRef<Path>]) -> Result<()> {
    let repo = Repository::discover(".")?;
    add::add(&repo, paths)
}
