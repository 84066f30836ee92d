//! Stored objects (blob, tree, commit) and the loose object store.

pub mod commit;
pub mod oid;
pub mod store;
pub mod tree;

pub use commit::{encode_commit, read_commit, write_commit, Commit, Signature};
pub use oid::Oid;
pub use store::{LooseObjectStore, ObjectType, RawObject, OBJECTS_DIR};
pub use tree::{flatten_tree, validate_path, write_tree, FileMode, FlatTree, Tree, TreeEntry};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryBackend;

    #[test]
    fn test_store_round_trip_through_all_codecs() {
        let backend = MemoryBackend::new();
        let store = LooseObjectStore::new(&backend);

        let hello = store.write(ObjectType::Blob, b"hello").unwrap();
        let world = store.write(ObjectType::Blob, b"world").unwrap();
        let mut files = FlatTree::new();
        files.insert("a.txt".to_string(), hello);
        files.insert("b/c.txt".to_string(), world);

        let tree = write_tree(&store, &files).unwrap();
        let sig = Signature::new("A", "a@example.com", 0, 0);
        let commit_oid = write_commit(&store, &tree, &[], &sig, &sig, "initial").unwrap();

        let commit = read_commit(&store, &commit_oid).unwrap();
        assert!(commit.is_root());
        assert_eq!(flatten_tree(&store, commit.tree()).unwrap(), files);
        assert_eq!(
            store.read_typed(&hello, ObjectType::Blob).unwrap(),
            b"hello"
        );
    }
}
