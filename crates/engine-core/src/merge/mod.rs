pub mod buffer;
pub mod merger;
pub mod results;
