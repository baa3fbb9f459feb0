use crate::error::Result;
use crate::index;
use crate::repo::Repository;

/// `ls-files [--verbose]`.
pub fn run(verbose: bool) -> Result<()> {
    let repo = Repository::discover(".")?;
    let idx = index::read(&repo)?;

    for entry in &idx.entries {
        if verbose {
            println!(
                "{:06o} {} {}\t{}",
                entry.mode_word(),
                hex::encode(entry.sha),
                entry.flag_stage >> 12,
                entry.name
            );
        } else {
            println!("{}", entry.name);
        }
    }
    Ok(())
}
