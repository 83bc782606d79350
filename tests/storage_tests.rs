use file_broker::storage::models::{FileRecord, FileStatus};
use file_broker::storage::{Database, FileRepository, RepositoryError};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_file(owner: &str) -> FileRecord {
    FileRecord::new_pending(owner, "application/pdf", 1024)
}

#[test]
fn test_new_pending_record() {
    let file = sample_file("user-1");
    assert!(!file.id.is_empty());
    assert_eq!(file.storage_path, format!("user-1/{}", file.id));
    assert_eq!(file.status, FileStatus::Pending);
    assert!(!file.is_deleted);
    assert_eq!(file.created_at, file.updated_at);

    let other = sample_file("user-1");
    assert_ne!(file.id, other.id);
}

#[test]
fn test_insert_and_get_file() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");

    assert!(db.insert_file(&file).unwrap());

    let retrieved = db.get_file(&file.id).unwrap().expect("file should exist");
    assert_eq!(retrieved, file);
}

#[test]
fn test_insert_duplicate_id() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");

    assert!(db.insert_file(&file).unwrap());
    assert!(!db.insert_file(&file).unwrap());
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("nonexistent").unwrap().is_none());
}

#[test]
fn test_update_file_status() {
    let (_dir, db) = test_db();
    let mut file = sample_file("user-1");
    db.insert_file(&file).unwrap();

    file.mark_uploaded();
    let updated = db.update_file(&file).unwrap().expect("file should update");
    assert_eq!(updated.status, FileStatus::Uploaded);
    assert!(updated.updated_at >= file.created_at);

    let stored = db.get_file(&file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::Uploaded);
}

#[test]
fn test_update_keeps_identity_fields() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");
    db.insert_file(&file).unwrap();

    let mut tampered = file.clone();
    tampered.owner_id = "someone-else".to_string();
    tampered.storage_path = "someone-else/x".to_string();
    tampered.size = 1;
    tampered.mark_uploaded();
    db.update_file(&tampered).unwrap();

    let stored = db.get_file(&file.id).unwrap().unwrap();
    assert_eq!(stored.owner_id, "user-1");
    assert_eq!(stored.storage_path, file.storage_path);
    assert_eq!(stored.size, 1024);
    assert_eq!(stored.status, FileStatus::Uploaded);
}

#[test]
fn test_update_never_moves_status_backwards() {
    let (_dir, db) = test_db();
    let mut file = sample_file("user-1");
    db.insert_file(&file).unwrap();

    file.mark_uploaded();
    db.update_file(&file).unwrap();

    let mut stale = file.clone();
    stale.status = FileStatus::Pending;
    db.update_file(&stale).unwrap();

    let stored = db.get_file(&file.id).unwrap().unwrap();
    assert_eq!(stored.status, FileStatus::Uploaded);
}

#[test]
fn test_update_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.update_file(&sample_file("user-1")).unwrap().is_none());
}

#[test]
fn test_soft_delete_hides_file() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");
    db.insert_file(&file).unwrap();

    assert!(db.soft_delete_file(&file.id).unwrap());
    assert!(db.get_file(&file.id).unwrap().is_none());

    // Still there for audit
    let audit = db.get_file_any(&file.id).unwrap().unwrap();
    assert!(audit.is_deleted);
    assert_eq!(audit.owner_id, "user-1");
}

#[test]
fn test_soft_delete_twice() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");
    db.insert_file(&file).unwrap();

    assert!(db.soft_delete_file(&file.id).unwrap());
    assert!(!db.soft_delete_file(&file.id).unwrap());
    assert!(!db.soft_delete_file("nonexistent").unwrap());
}

#[test]
fn test_update_after_soft_delete() {
    let (_dir, db) = test_db();
    let mut file = sample_file("user-1");
    db.insert_file(&file).unwrap();
    db.soft_delete_file(&file.id).unwrap();

    file.mark_uploaded();
    assert!(db.update_file(&file).unwrap().is_none());

    let audit = db.get_file_any(&file.id).unwrap().unwrap();
    assert_eq!(audit.status, FileStatus::Pending);
    assert!(audit.is_deleted);
}

#[test]
fn test_reopen_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_file("user-1");
    {
        let db = Database::open(dir.path()).unwrap();
        db.insert_file(&file).unwrap();
    }
    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.get_file(&file.id).unwrap().unwrap().id, file.id);
}

// ============================================================================
// FileRepository trait
// ============================================================================

#[tokio::test]
async fn test_repository_round_trip() {
    let (_dir, db) = test_db();
    let mut file = sample_file("user-1");

    let created = db.create(&file).await.unwrap();
    assert_eq!(created.id, file.id);

    let fetched = db.get_by_id(&file.id).await.unwrap();
    assert_eq!(fetched.status, FileStatus::Pending);

    file.mark_uploaded();
    let updated = db.update(&file).await.unwrap();
    assert_eq!(updated.status, FileStatus::Uploaded);

    db.soft_delete(&file.id).await.unwrap();
    assert!(matches!(
        db.get_by_id(&file.id).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(
        db.update(&file).await,
        Err(RepositoryError::NotFound(_))
    ));
    assert!(matches!(
        db.soft_delete(&file.id).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_repository_create_duplicate() {
    let (_dir, db) = test_db();
    let file = sample_file("user-1");

    db.create(&file).await.unwrap();
    assert!(matches!(
        db.create(&file).await,
        Err(RepositoryError::AlreadyExists(_))
    ));
}
