//! Data models.

pub mod config;
pub mod finding;
pub mod report;
