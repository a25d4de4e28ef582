pub mod connection;
pub mod identifiers;
pub mod value;
