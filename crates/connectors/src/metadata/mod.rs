pub mod cache;
pub mod loader;
pub mod query;
pub mod source;
