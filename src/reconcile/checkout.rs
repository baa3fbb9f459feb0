//! Checkout: materializes a tree into an empty directory. Deliberately narrower than the full
//! working-tree reconciliation a `checkout` command usually performs (switching branches,
//! merging local changes): this only ever writes a tree into an empty directory, so symlink
//! and gitlink leaves are written as their literal payload rather than a real symlink or
//! submodule checkout.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use crate::error::{IoResultExt, RepoError, Result};
use crate::object::{read_object, Tree};
use crate::repo::Repository;

pub fn checkout_tree_to_dir(repo: &Repository, tree_hash: &str, target: &Path) -> Result<()> {
    if target.is_dir() {
        let has_entries = fs::read_dir(target).with_path(target)?.next().is_some();
        if has_entries {
            return Err(RepoError::CheckoutDirNotEmpty(target.to_path_buf()));
        }
    } else {
        fs::create_dir_all(target).with_path(target)?;
    }

    let obj = read_object(repo, tree_hash)?;
    let tree = obj.as_tree()?;
    write_tree(repo, tree, target)
}

fn write_tree(repo: &Repository, tree: &Tree, target: &Path) -> Result<()> {
    for leaf in &tree.leaves {
        let name = String::from_utf8_lossy(&leaf.path);
        let dest = target.join(name.as_ref());

        if leaf.is_directory() {
            fs::create_dir_all(&dest).with_path(&dest)?;
            let sub_hash = hex::encode(leaf.sha);
            let sub_obj = read_object(repo, &sub_hash)?;
            write_tree(repo, sub_obj.as_tree()?, &dest)?;
            continue;
        }

        let blob_obj = read_object(repo, &hex::encode(leaf.sha))?;
        let data = blob_obj.as_blob()?;
        fs::write(&dest, data).with_path(&dest)?;

        if leaf.is_symlink() || leaf.is_gitlink() {
            tracing::warn!(path = %dest.display(), "leaf mode not representable on the filesystem here, wrote literal blob payload");
        } else {
            let mode = if is_executable(leaf) { 0o755 } else { 0o644 };
            fs::set_permissions(&dest, fs::Permissions::from_mode(mode)).with_path(&dest)?;
        }
    }
    Ok(())
}

fn is_executable(leaf: &crate::object::TreeLeaf) -> bool {
    leaf.mode.ends_with(b"755")
}
