pub mod common;
pub mod drop_table;
pub mod expr;
pub mod merge;
pub mod select;
