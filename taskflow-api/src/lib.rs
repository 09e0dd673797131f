//! # TaskFlow API Server Library
//!
//! HTTP surface for TaskFlow: routing, configuration and error mapping on top
//! of `taskflow-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
