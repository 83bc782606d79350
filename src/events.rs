//! S3-style bucket event notifications (AWS, MinIO).
//!
//! Only object-created records matter: each one names an object key of the
//! form `{owner_id}/{file_id}`, and the final segment is the file to confirm.

use serde::Deserialize;

const OBJECT_CREATED_PREFIX: &str = "s3:ObjectCreated:";

#[derive(Debug, Default, Deserialize)]
pub struct EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub s3: S3Entity,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub object: S3Object,
}

#[derive(Debug, Default, Deserialize)]
pub struct S3Object {
    #[serde(default)]
    pub key: String,
}

impl EventRecord {
    pub fn is_object_created(&self) -> bool {
        self.event_name.starts_with(OBJECT_CREATED_PREFIX)
    }
}

impl EventNotification {
    /// File ids of every object-created record with a usable key.
    pub fn created_file_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_object_created() && !r.s3.object.key.is_empty())
            .filter_map(|r| {
                let id = file_id_from_key(&r.s3.object.key);
                if id.is_none() {
                    tracing::warn!(key = %r.s3.object.key, "Invalid object key format");
                }
                id
            })
            .collect()
    }
}

/// Extract the file id from an event object key.
///
/// Keys arrive form-encoded (`+` for space). A key needs at least an owner
/// segment and a file segment.
pub fn file_id_from_key(raw_key: &str) -> Option<String> {
    let plus_decoded = raw_key.replace('+', " ");
    let key = match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw_key.to_string(),
    };

    let mut segments = key.rsplit('/');
    let file_id = segments.next()?;
    segments.next()?;

    if file_id.is_empty() {
        return None;
    }
    Some(file_id.to_string())
}
