pub mod error;
pub mod merge_script;
pub mod qualifier;
pub mod query;
