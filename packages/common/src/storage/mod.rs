mod error;
mod filename;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filename::{MAX_FILENAME_CHARS, extension_of, sanitize_filename};
pub use filesystem::FilesystemMediaStore;
pub use traits::{BoxReader, MediaStore, StorageKind, StoredFile};
