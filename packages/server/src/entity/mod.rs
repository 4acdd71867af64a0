pub mod collection;
pub mod photo;
pub mod user;
