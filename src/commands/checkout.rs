use std::path::Path;

use crate::error::Result;
use crate::object::ObjectKind;
use crate::reconcile::checkout;
use crate::repo::Repository;
use crate::resolve;

/// `checkout <name> <empty-dir>`.
pub fn run(name: &str, target: &Path) -> Result<()> {
    let repo = Repository::discover(".")?;
    let tree_hash = resolve::find(&repo, name, Some(ObjectKind::Tree), true)?;
    checkout::checkout_tree_to_dir(&repo, &tree_hash, target)
}
