pub mod core;
pub mod entity;
pub mod merge;
pub mod records;
pub mod schema;
