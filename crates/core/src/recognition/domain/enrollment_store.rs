use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read enrollment database {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write enrollment database {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed enrollment database: {0}")]
    Format(#[from] serde_json::Error),
}

/// One enrolled face as persisted between runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrolledIdentity {
    pub id: i32,
    pub label: String,
    pub embedding: Vec<f32>,
}

/// Persistence port for the recognizer's identity database.
pub trait EnrollmentStore: Send {
    /// Returns the persisted identities; an absent database is empty.
    fn load(&mut self) -> Result<Vec<EnrolledIdentity>, StoreError>;

    /// Replaces the persisted database with `identities`.
    fn save(&mut self, identities: &[EnrolledIdentity]) -> Result<(), StoreError>;
}

/// Store that keeps nothing across runs.
#[derive(Default)]
pub struct VolatileEnrollmentStore {
    saved: Vec<EnrolledIdentity>,
}

impl EnrollmentStore for VolatileEnrollmentStore {
    fn load(&mut self) -> Result<Vec<EnrolledIdentity>, StoreError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, identities: &[EnrolledIdentity]) -> Result<(), StoreError> {
        self.saved = identities.to_vec();
        Ok(())
    }
}
