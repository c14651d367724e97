pub mod search;
pub mod sweep;
