use std::collections::BTreeMap;

use crate::commit::{stamp, trailing_newline};
use crate::config;
use crate::error::Result;
use crate::object::{read_object, write_object, GitObject, Kvlm};
use crate::refs::{self, RefTree};
use crate::repo::Repository;
use crate::resolve;

/// `tag [-a] [-m <msg>] [<name> [<obj>]]`. With no `name`, lists existing tags; otherwise
/// creates one, annotated (a tag object) when `-a` is given, lightweight (a plain ref)
/// otherwise.
pub fn run(annotate: bool, message: Option<&str>, name: Option<&str>, object: Option<&str>) -> Result<()> {
    let repo = Repository::discover(".")?;

    let Some(name) = name else {
        let tree = refs::list(&repo, "refs/tags")?;
        print_tags(&tree, "refs/tags");
        return Ok(());
    };

    let target = object.unwrap_or("HEAD");
    let target_hash = resolve::find(&repo, target, None, false)?;

    if annotate {
        let target_obj = read_object(&repo, &target_hash)?;

        let mut kvlm = Kvlm::new();
        kvlm.push("object", target_hash.as_bytes().to_vec());
        kvlm.push("type", target_obj.kind().as_str().as_bytes().to_vec());
        kvlm.push("tag", name.as_bytes().to_vec());
        let (user_name, email) = config::resolve_identity(repo.config())?;
        kvlm.push("tagger", stamp(&user_name, &email).as_bytes().to_vec());
        kvlm.message = trailing_newline(message.unwrap_or(""));

        let hash = write_object(Some(&repo), &GitObject::Tag(kvlm))?;
        refs::create(&repo, &format!("refs/tags/{name}"), &hash)?;
    } else {
        refs::create(&repo, &format!("refs/tags/{name}"), &target_hash)?;
    }
    Ok(())
}

fn print_tags(tree: &BTreeMap<String, RefTree>, prefix: &str) {
    for (name, node) in tree {
        match node {
            RefTree::Hash(hash) => println!("{hash} {prefix}/{name}"),
            RefTree::SubTree(sub) => print_tags(sub, &format!("{prefix}/{name}")),
        }
    }
}
