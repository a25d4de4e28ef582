pub mod action;
pub mod qualifier;
pub mod result;
