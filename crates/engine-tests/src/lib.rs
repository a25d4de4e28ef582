#![allow(dead_code)]

pub mod integration;
pub mod memory;
pub mod utils;
