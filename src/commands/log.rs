use std::collections::HashSet;

use crate::error::{RepoError, Result};
use crate::object::{read_object, GitObject, ObjectKind};
use crate::repo::Repository;
use crate::resolve;

/// `log [<name>]`: emits a graphviz DOT graph of the commit ancestry reachable from `name`
/// (defaulting to `HEAD`), one node per commit with edges to its parents.
pub fn run(name: Option<&str>) -> Result<()> {
    let repo = Repository::discover(".")?;
    let start = resolve::find(&repo, name.unwrap_or("HEAD"), Some(ObjectKind::Commit), true)?;

    println!("digraph minigitlog{{");
    println!("  node[shape=rect]");
    let mut seen = HashSet::new();
    walk(&repo, &start, &mut seen)?;
    println!("}}");
    Ok(())
}

fn walk(repo: &Repository, hash: &str, seen: &mut HashSet<String>) -> Result<()> {
    if !seen.insert(hash.to_string()) {
        return Ok(());
    }

    let obj = read_object(repo, hash)?;
    let GitObject::Commit(kvlm) = &obj else {
        return Err(RepoError::TypeMismatch {
            expected: "commit",
            actual: obj.kind().as_str().to_string(),
            name: hash.to_string(),
        });
    };

    let message = String::from_utf8_lossy(&kvlm.message);
    let summary = message.lines().next().unwrap_or("").replace('\\', "\\\\").replace('"', "\\\"");
    println!("  c_{hash} [label=\"{}: {summary}\"]", &hash[..7]);

    for parent in kvlm.get_all("parent") {
        let parent_hash = String::from_utf8_lossy(parent).into_owned();
        println!("  c_{hash} -> c_{parent_hash}");
        walk(repo, &parent_hash, seen)?;
    }

    Ok(())
}
