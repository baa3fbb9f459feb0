//! End-to-end scenarios driven straight through the library API (no subprocess spawning),
//! the same style `web3infra-foundation-git-internal`'s integration tests use.

use std::fs;

use minigit::commit;
use minigit::error::RepoError;
use minigit::ignore;
use minigit::index;
use minigit::object::{self, GitObject, ObjectKind};
use minigit::reconcile::{add, checkout, rm};
use minigit::repo::Repository;
use minigit::resolve;

fn repo_with_identity(path: &std::path::Path) -> Repository {
    let repo = Repository::init(path).unwrap();
    let mut cfg = repo.config().clone();
    cfg.set("user", "name", "Test User");
    cfg.set("user", "email", "test@example.com");
    cfg.save(&repo.repo_path(&["config"])).unwrap();
    Repository::discover(path).unwrap()
}

#[test]
fn init_and_empty_commit_yields_the_well_known_empty_tree() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repo_with_identity(dir.path());

    let commit_hash = commit::commit(&repo, "root").unwrap();
    let obj = object::read_object(&repo, &commit_hash).unwrap();
    let kvlm = obj.as_commit().unwrap();

    assert_eq!(
        kvlm.get_one_str("tree").unwrap(),
        "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
    );
}

#[test]
fn hash_object_of_hello_matches_known_blob_hash() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let hash = object::hash_bytes(Some(&repo), ObjectKind::Blob, b"hello\n".to_vec()).unwrap();
    assert_eq!(hash, "ce013625030ba8dba906f756967f9e9ca394464a");
}

#[test]
fn add_commit_checkout_round_trips_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repo_with_identity(dir.path());

    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/b.txt"), b"x\n").unwrap();

    add::add(&repo, &[dir.path().join("a/b.txt")]).unwrap();
    commit::commit(&repo, "m").unwrap();

    let out = tempfile::tempdir().unwrap();
    let tree_hash = resolve::find(&repo, "HEAD", Some(ObjectKind::Tree), true).unwrap();
    checkout::checkout_tree_to_dir(&repo, &tree_hash, out.path()).unwrap();

    assert_eq!(fs::read(out.path().join("a/b.txt")).unwrap(), b"x\n");

    // repeating the checkout into a second empty directory is idempotent
    let out2 = tempfile::tempdir().unwrap();
    checkout::checkout_tree_to_dir(&repo, &tree_hash, out2.path()).unwrap();
    assert_eq!(fs::read(out2.path().join("a/b.txt")).unwrap(), b"x\n");
}

#[test]
fn rev_parse_reports_ambiguous_then_resolves_on_longer_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    // brute-force two blobs that share at least a 5-char hash prefix
    let mut hashes = Vec::new();
    for i in 0u32..6000 {
        hashes.push(object::write_object(Some(&repo), &GitObject::Blob(i.to_string().into_bytes())).unwrap());
    }
    hashes.sort();

    let collision = (0..hashes.len() - 1).find_map(|i| {
        let common = hashes[i]
            .bytes()
            .zip(hashes[i + 1].bytes())
            .take_while(|(a, b)| a == b)
            .count();
        (common >= 5).then(|| (hashes[i][..5].to_string(), hashes[i].clone()))
    });

    let Some((prefix, unique_hash)) = collision else {
        // vanishingly unlikely with 6000 samples, but don't fail the suite over it
        return;
    };

    let err = resolve::find(&repo, &prefix, None, false).unwrap_err();
    assert!(matches!(err, RepoError::AmbiguousName { .. }));

    let found = resolve::find(&repo, &unique_hash, None, false).unwrap();
    assert_eq!(found, unique_hash);
}

#[test]
fn annotated_tag_resolves_through_commit_to_tree() {
    let dir = tempfile::tempdir().unwrap();
    let repo = repo_with_identity(dir.path());

    let commit_hash = commit::commit(&repo, "root").unwrap();
    let commit_obj = object::read_object(&repo, &commit_hash).unwrap();
    let tree_hash = commit_obj.as_commit().unwrap().get_one_str("tree").unwrap();

    let mut kvlm = minigit::object::Kvlm::new();
    kvlm.push("object", commit_hash.as_bytes().to_vec());
    kvlm.push("type", b"commit".to_vec());
    kvlm.push("tag", b"v1".to_vec());
    kvlm.push("tagger", b"Test User <test@example.com> 1 +0000".to_vec());
    kvlm.message = b"release\n".to_vec();
    let tag_hash = object::write_object(Some(&repo), &GitObject::Tag(kvlm)).unwrap();
    minigit::refs::create(&repo, "refs/tags/v1", &tag_hash).unwrap();

    let resolved_tree = resolve::find(&repo, "v1", Some(ObjectKind::Tree), true).unwrap();
    assert_eq!(resolved_tree, tree_hash);
}

#[test]
fn add_then_remove_restores_original_index() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    fs::write(dir.path().join("pre-existing.txt"), b"already staged\n").unwrap();
    add::add(&repo, &[dir.path().join("pre-existing.txt")]).unwrap();
    let original = index::read(&repo).unwrap();

    fs::write(dir.path().join("a.txt"), b"x\n").unwrap();
    add::add(&repo, &[dir.path().join("a.txt")]).unwrap();
    rm::rm(&repo, &[dir.path().join("a.txt")], true).unwrap();

    let after = index::read(&repo).unwrap();
    assert_eq!(after, original);
}

#[test]
fn scoped_negation_overrides_absolute_ignore_rule() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    fs::create_dir_all(repo.repo_path(&["info"])).unwrap();
    fs::write(repo.repo_path(&["info", "exclude"]), "*.log\n").unwrap();

    fs::create_dir_all(dir.path().join("d")).unwrap();
    fs::write(dir.path().join("d/.gitignore"), "!keep.log\n").unwrap();
    fs::write(dir.path().join("d/keep.log"), b"keep\n").unwrap();
    fs::write(dir.path().join("d/x.log"), b"drop\n").unwrap();

    add::add(&repo, &[dir.path().join("d/.gitignore")]).unwrap();
    let idx = index::read(&repo).unwrap();

    let rules = ignore::read(&repo).unwrap();
    assert!(!ignore::is_ignored(&rules, "d/keep.log").unwrap());
    assert!(ignore::is_ignored(&rules, "d/x.log").unwrap());
    assert_eq!(idx.entries.len(), 1);
}
