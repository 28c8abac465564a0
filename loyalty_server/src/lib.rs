//! # Loyalty points server
//! This crate hosts the long-running process for the loyalty points server. It is responsible for:
//! * Loading configuration from the environment.
//! * Opening the database and bringing its schema up to date.
//! * Running the accrual reconciliation worker until the process is asked to stop.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod accrual_worker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod server;
