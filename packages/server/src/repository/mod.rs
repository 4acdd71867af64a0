pub mod collection;
pub mod photo;

pub use collection::{CollectionChanges, CollectionRepository, CreateCollectionError, NewCollection};
pub use photo::PhotoRepository;

/// Row offset of a 1-based page, saturating instead of overflowing.
pub(crate) fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page)
}
