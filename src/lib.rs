//! Kinship Records - family health-record API
//!
//! Owners register family members and their health records, and can hand out
//! 24-hour emergency access links that expose a reduced, read-only view of a
//! single member's records without authentication.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod emergency;
pub mod error;
pub mod family;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod rate_limit;
pub mod server;
