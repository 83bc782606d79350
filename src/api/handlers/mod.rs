mod files;
mod health;
mod webhook;

pub use files::{create_upload, delete_file, download_file};
pub use health::{health, ready};
pub use webhook::storage_event;
