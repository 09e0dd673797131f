//! # TaskFlow Shared Library
//!
//! Domain types, access control and persistence seams used by the TaskFlow
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Token service, session middleware, authorization engine, passwords
//! - `models`: Users, projects, memberships and tasks
//! - `store`: The persistence trait plus in-memory and PostgreSQL backends
//! - `services`: Membership lifecycle and the other role-gated operations
//! - `db`: PostgreSQL connection pool management

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the TaskFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
