pub mod buffer;
pub mod row;
