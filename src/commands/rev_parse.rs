use crate::error::Result;
use crate::object::ObjectKind;
use crate::repo::Repository;
use crate::resolve;

/// `rev-parse [--git-type <type>] <name>`.
pub fn run(git_type: Option<&str>, name: &str) -> Result<()> {
    let repo = Repository::discover(".")?;
    let required = git_type.map(ObjectKind::parse).transpose()?;
    let hash = resolve::find(&repo, name, required, true)?;
    println!("{hash}");
    Ok(())
}
