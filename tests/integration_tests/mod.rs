//! Integration tests module
//!
//! End-to-end tests for the outreach backend, including:
//! - REST API behavior and error bodies
//! - Save audience -> fan-out -> status callback -> campaign view
//! - Persistence and concurrent status updates on SQLite

pub mod api_test;
pub mod delivery_flow_test;
pub mod sqlite_test;
