use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::recognition::domain::enrollment_store::{EnrolledIdentity, EnrollmentStore, StoreError};

/// Persists enrolled identities as a pretty-printed JSON array.
pub struct JsonEnrollmentStore {
    path: PathBuf,
}

impl JsonEnrollmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EnrollmentStore for JsonEnrollmentStore {
    fn load(&mut self) -> Result<Vec<EnrolledIdentity>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&mut self, identities: &[EnrolledIdentity]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(identities)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
