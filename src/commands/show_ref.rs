use std::collections::BTreeMap;

use crate::error::Result;
use crate::refs::{self, RefTree};
use crate::repo::Repository;

/// `show-ref`.
pub fn run() -> Result<()> {
    let repo = Repository::discover(".")?;
    let tree = refs::list(&repo, "refs")?;
    print_tree(&tree, "refs");
    Ok(())
}

fn print_tree(tree: &BTreeMap<String, RefTree>, prefix: &str) {
    for (name, node) in tree {
        let path = format!("{prefix}/{name}");
        match node {
            RefTree::Hash(hash) => println!("{hash} {path}"),
            RefTree::SubTree(sub) => print_tree(sub, &path),
        }
    }
}
