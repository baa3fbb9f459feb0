//! Builds a tree object (and the subtree forest beneath it) from a flat [`Index`], bottom-up:
//! a directory appears in its parent as a single `40000` leaf, never flattened.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::index::{Index, IndexEntry};
use crate::object::{write_object, GitObject, Tree, TreeLeaf};
use crate::repo::Repository;

enum Node {
    File(IndexEntry),
    Dir(BTreeMap<String, Node>),
}

/// Writes the tree (and every subtree) the index describes, returning the root tree's hash.
pub fn build(repo: &Repository, index: &Index) -> Result<String> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();
    for entry in &index.entries {
        let parts: Vec<&str> = entry.name.split('/').collect();
        insert(&mut root, &parts, entry);
    }
    write_dir(repo, &root)
}

fn insert(dir: &mut BTreeMap<String, Node>, parts: &[&str], entry: &IndexEntry) {
    match parts {
        [] => {}
        [leaf] => {
            dir.insert(leaf.to_string(), Node::File(entry.clone()));
        }
        [first, rest @ ..] => {
            let node = dir.entry(first.to_string()).or_insert_with(|| Node::Dir(BTreeMap::new()));
            if let Node::Dir(sub) = node {
                insert(sub, rest, entry);
            }
        }
    }
}

fn write_dir(repo: &Repository, dir: &BTreeMap<String, Node>) -> Result<String> {
    let mut tree = Tree::default();

    for (name, node) in dir {
        match node {
            Node::File(entry) => {
                let mode: &[u8] = match entry.mode_type {
                    IndexEntry::MODE_SYMLINK => b"120000",
                    IndexEntry::MODE_GITLINK => b"160000",
                    _ if entry.mode_perms & 0o111 != 0 => b"100755",
                    _ => b"100644",
                };
                tree.leaves.push(TreeLeaf::new(mode, name.as_bytes().to_vec(), entry.sha));
            }
            Node::Dir(sub) => {
                let sub_hash = write_dir(repo, sub)?;
                let mut sha = [0u8; 20];
                hex::decode_to_slice(&sub_hash, &mut sha).expect("hash is always 40 hex chars");
                tree.leaves.push(TreeLeaf::new(b"40000".as_slice(), name.as_bytes().to_vec(), sha));
            }
        }
    }

    write_object(Some(repo), &GitObject::Tree(tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FileTime;
    use crate::object::read_object;
    use tempfile::tempdir;

    fn entry(name: &str, byte: u8) -> IndexEntry {
        IndexEntry {
            ctime: FileTime::default(),
            mtime: FileTime::default(),
            dev: 0,
            ino: 0,
            mode_type: IndexEntry::MODE_REGULAR,
            mode_perms: 0o644,
            uid: 0,
            gid: 0,
            size: 0,
            sha: [byte; 20],
            flag_assume_valid: false,
            flag_stage: 0,
            name: name.to_string(),
        }
    }

    #[test]
    fn builds_nested_tree() {
        let dir = tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let mut index = Index::new();
        index.upsert(entry("a.txt", 1));
        index.upsert(entry("sub/b.txt", 2));
        index.upsert(entry("sub/deep/c.txt", 3));

        let root_hash = build(&repo, &index).unwrap();
        let root = read_object(&repo, &root_hash).unwrap();
        let root_tree = root.as_tree().unwrap();

        assert_eq!(root_tree.leaves.len(), 2); // "a.txt" and "sub"
        let sub_leaf = root_tree.leaves.iter().find(|l| l.path == b"sub").unwrap();
        assert!(sub_leaf.is_directory());

        let sub_hex = hex::encode(sub_leaf.sha);
        let sub_tree = read_object(&repo, &sub_hex).unwrap();
        assert_eq!(sub_tree.as_tree().unwrap().leaves.len(), 2); // "b.txt" and "deep"
    }
}
