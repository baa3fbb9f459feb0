use std::path::Path;

use crate::error::Result;
use crate::ignore;
use crate::repo::Repository;

/// `check-ignore <path>...`; prints each path that is ignored, one per line.
pub fn run(paths: &[impl AsRef<Path>]) -> Result<()> {
    let repo = Repository::discover(".")?;
    let rules = ignore::read(&repo)?;

    for path in paths {
        let rel = repo.rel_to_worktree(path.as_ref())?;
        let rel_str = rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        if ignore::is_ignored(&rules, &rel_str)? {
            println!("{rel_str}");
        }
    }
    Ok(())
}
