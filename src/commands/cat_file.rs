use std::io::{stdout, Write};

use crate::error::{RepoError, Result};
use crate::object::{read_object, GitObject, ObjectKind};
use crate::repo::Repository;
use crate::resolve;

/// `cat-file <type> <name>`.
pub fn run(kind: &str, name: &str) -> Result<()> {
    let repo = Repository::discover(".")?;
    let wanted = ObjectKind::parse(kind)?;
    let hash = resolve::find(&repo, name, Some(wanted), false)?;
    let obj = read_object(&repo, &hash)?;

    let mut out = stdout().lock();
    match &obj {
        GitObject::Blob(data) => out.write_all(data).map_err(|e| RepoError::io(name, e))?,
        GitObject::Tree(tree) => {
            for leaf in &tree.leaves {
                let mode = String::from_utf8_lossy(&leaf.mode);
                let path = String::from_utf8_lossy(&leaf.path);
                writeln!(
                    out,
                    "{mode:0>6} {} {}\t{path}",
                    leaf.object_kind().as_str(),
                    hex::encode(leaf.sha)
                )
                .map_err(|e| RepoError::io(name, e))?;
            }
        }
        GitObject::Commit(kvlm) | GitObject::Tag(kvlm) => {
            out.write_all(&kvlm.serialize()).map_err(|e| RepoError::io(name, e))?;
        }
    }
    Ok(())
}
