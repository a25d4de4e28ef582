pub mod blocking;
pub mod config;
pub mod error;
pub mod merge;
