pub mod drop_table;
pub mod merge;
pub mod select;
