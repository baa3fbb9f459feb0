use crate::commit;
use crate::error::Result;
use crate::repo::Repository;

/// `commit -m <msg>`.
pub fn run(message: &str) -> Result<()> {
    let repo = Repository::discover(".")?;
    let hash = commit::commit(&repo, message)?;
    println!("{hash}");
    Ok(())
}
