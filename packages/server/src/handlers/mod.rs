pub mod admin_collection;
pub mod auth;
pub mod collection;
pub mod health;
pub mod media;
