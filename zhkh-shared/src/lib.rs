//! # ZHKH Shared Library
//!
//! This crate contains the types, storage layer and HTTP plumbing shared by the
//! back-office services and the API gateway.
//!
//! ## Module Organization
//!
//! - `api`: Response envelope, error type and request extractors
//! - `auth`: Password hashing
//! - `db`: SQLite connection pool and per-service migrations
//! - `models`: Database records and their CRUD operations
//! - `telemetry`: Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod db;
pub mod models;
pub mod telemetry;

/// Current version of the ZHKH shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
