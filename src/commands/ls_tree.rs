use std::io::{stdout, Write};

use crate::error::{RepoError, Result};
use crate::object::{read_object, ObjectKind};
use crate::repo::Repository;
use crate::resolve;

/// `ls-tree [-r] <name>`.
pub fn run(recursive: bool, name: &str) -> Result<()> {
    let repo = Repository::discover(".")?;
    let hash = resolve::find(&repo, name, Some(ObjectKind::Tree), true)?;
    let mut out = stdout().lock();
    print_tree(&repo, &hash, "", recursive, &mut out)
}

fn print_tree(repo: &Repository, hash: &str, prefix: &str, recursive: bool, out: &mut impl Write) -> Result<()> {
    let obj = read_object(repo, hash)?;
    let tree = obj.as_tree()?;

    for leaf in &tree.leaves {
        let mode = String::from_utf8_lossy(&leaf.mode);
        let name = String::from_utf8_lossy(&leaf.path);
        let full_path = if prefix.is_empty() { name.into_owned() } else { format!("{prefix}/{name}") };

        if recursive && leaf.is_directory() {
            print_tree(repo, &hex::encode(leaf.sha), &full_path, recursive, out)?;
        } else {
            writeln!(
                out,
                "{mode:0>6} {} {}\t{full_path}",
                leaf.object_kind().as_str(),
                hex::encode(leaf.sha)
            )
            .map_err(|e| RepoError::io(&full_path, e))?;
        }
    }
    Ok(())
}
