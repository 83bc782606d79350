use redb::TableDefinition;

/// File records: uuid -> FileRecord (msgpack). Soft-deleted records stay here.
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");
