pub mod auth;
pub mod collection;
pub mod photo;
pub mod shared;
