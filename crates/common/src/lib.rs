//! Common building blocks shared across the tablebridge crates:
//! - **Configuration**: Strongly typed application configuration (`config`).
//! - **Action protocol**: Requests, responses and caller context of the
//!   action-execution host (`action`).
//! - **Telemetry**: Logging and tracing setup (`telemetry`).
pub mod action;
pub mod config;
pub mod telemetry;
