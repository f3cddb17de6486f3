//! Report export

pub mod json;
