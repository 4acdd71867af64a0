pub mod access_code;
pub mod config;
pub mod imaging;
pub mod retry;
pub mod storage;

pub use access_code::CodeError;
pub use imaging::{ExifData, ImagingError};
pub use storage::{FilesystemMediaStore, MediaStore, StorageError, StorageKind, StoredFile};
