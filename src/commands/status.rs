use crate::error::Result;
use crate::index;
use crate::reconcile::status::{self, BranchStatus};
use crate::repo::Repository;

/// `status`.
pub fn run() -> Result<()> {
    let repo = Repository::discover(".")?;
    let idx = index::read(&repo)?;

    match status::branch_status(&repo)? {
        BranchStatus::Branch(name) => println!("On branch {name}"),
        BranchStatus::Detached(hash) => println!("HEAD detached at {}", &hash[..12]),
    }

    let head_diff = status::head_index_diff(&repo, &idx)?;
    if !head_diff.added.is_empty() || !head_diff.modified.is_empty() || !head_diff.deleted.is_empty() {
        println!("\nChanges to be committed:");
        for p in &head_diff.added {
            println!("\tnew file:   {p}");
        }
        for p in &head_diff.modified {
            println!("\tmodified:   {p}");
        }
        for p in &head_diff.deleted {
            println!("\tdeleted:    {p}");
        }
    }

    let wt_diff = status::index_worktree_diff(&repo, &idx)?;
    if !wt_diff.modified.is_empty() || !wt_diff.deleted.is_empty() {
        println!("\nChanges not staged for commit:");
        for p in &wt_diff.modified {
            println!("\tmodified:   {p}");
        }
        for p in &wt_diff.deleted {
            println!("\tdeleted:    {p}");
        }
    }

    if !wt_diff.untracked.is_empty() {
        println!("\nUntracked files:");
        for p in &wt_diff.untracked {
            println!("\t{p}");
        }
    }

    Ok(())
}
