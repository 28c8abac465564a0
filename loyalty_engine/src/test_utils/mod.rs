//! Helpers for tests: throw-away SQLite databases and in-memory fakes for the accrual loop's collaborators.
pub mod memory_store;
pub mod prepare_env;
pub mod scripted_oracle;
