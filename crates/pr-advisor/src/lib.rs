//! Purchase-request risk scoring, effort recommendations and the HTTP surface
//! that records and reports on them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
