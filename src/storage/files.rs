use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Insert a new file record. Returns false if the id is already taken.
    pub fn insert_file(&self, file: &FileRecord) -> Result<bool, DatabaseError> {
        debug_assert!(!file.id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(FILES)?;
            let taken = table.get(file.id.as_str())?.is_some();
            if taken {
                false
            } else {
                let data = rmp_serde::to_vec_named(file)?;
                table.insert(file.id.as_str(), data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Get a live (not soft-deleted) file by its UUID
    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        Ok(self.get_file_any(id)?.filter(|f| !f.is_deleted))
    }

    /// Get a file by its UUID even if it has been soft-deleted (audit reads)
    pub fn get_file_any(&self, id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Write the mutable state of a live record. Read, check and write happen in
    /// one write transaction, so concurrent updates of the same id serialize.
    ///
    /// Returns `None` when the record is missing or soft-deleted. Identity
    /// fields are taken from the stored record, and the status never moves
    /// backwards.
    pub fn update_file(&self, file: &FileRecord) -> Result<Option<FileRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(file.id.as_str())? {
                Some(data) => {
                    let stored: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(stored)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut stored) if !stored.is_deleted => {
                if !stored.is_uploaded() {
                    stored.status = file.status;
                }
                stored.updated_at = chrono::Utc::now();

                let serialized = rmp_serde::to_vec_named(&stored)?;
                let mut table = write_txn.open_table(FILES)?;
                table.insert(stored.id.as_str(), serialized.as_slice())?;
                Some(stored)
            }
            _ => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Mark a live record as deleted. Returns false if it was missing or
    /// already deleted.
    pub fn soft_delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let stored: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(stored)
                }
                None => None,
            };
            result
        };

        let deleted = match existing {
            Some(mut stored) if !stored.is_deleted => {
                stored.mark_deleted();
                let serialized = rmp_serde::to_vec_named(&stored)?;
                let mut table = write_txn.open_table(FILES)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            _ => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }
}
