//! Document and key traits

use std::fmt::Debug;
use std::hash::Hash;

use serde::{de::DeserializeOwned, Serialize};

/// Key of a stored document; backends that need text keys use `as_str`
pub trait DocumentKey: Clone + Debug + Send + Sync + Eq + Hash {
    fn as_str(&self) -> &str;
}

/// A JSON-serializable document kept in a named collection
pub trait Document: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    type Key: DocumentKey;

    /// Collection (table) the documents of this type live in
    const COLLECTION: &'static str;

    fn key(&self) -> &Self::Key;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct NoteKey(String);

    impl DocumentKey for NoteKey {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Note {
        #[serde(skip)]
        key: Option<NoteKey>,
        body: String,
    }

    impl Document for Note {
        type Key = NoteKey;

        const COLLECTION: &'static str = "notes";

        fn key(&self) -> &Self::Key {
            self.key.as_ref().expect("test notes always carry a key")
        }
    }

    #[test]
    fn test_document_key() {
        let note = Note {
            key: Some(NoteKey("n-1".to_string())),
            body: "hello".to_string(),
        };
        assert_eq!(note.key().as_str(), "n-1");
        assert_eq!(Note::COLLECTION, "notes");
    }
}
