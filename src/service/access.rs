//! Download authorization.

use crate::storage::FileRecord;

/// An authenticated caller, as established by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub scopes: Vec<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Scope granting read access to one file to someone other than its owner.
pub fn read_scope(file_id: &str) -> String {
    format!("file:{file_id}:read")
}

/// Owners can always read; anyone else needs the exact per-file read scope.
/// Anonymous callers are never allowed.
pub fn can_read(file: &FileRecord, requester: Option<&Identity>) -> bool {
    let Some(identity) = requester else {
        return false;
    };

    if !identity.user_id.is_empty() && identity.user_id == file.owner_id {
        return true;
    }

    identity.has_scope(&read_scope(&file.id))
}
