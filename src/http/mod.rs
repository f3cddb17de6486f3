//! Probe transport for Tiresias

pub mod client;
pub mod oracle;
pub use client::HttpOracle;
pub use oracle::Oracle;
