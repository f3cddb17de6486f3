//! Tiresias - staged UNION-based SQL injection reconnaissance
//!
//! Discovers, one stage at a time, whether a query parameter is injectable,
//! which comment style the backend accepts, how wide the vulnerable query's
//! result set is, which database engine answers, where credentials live and
//! finally a chosen user's password. Built for deliberately vulnerable lab
//! targets.

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod models;
pub mod recon;
pub mod report;
