//! # ZHKH Back-Office Services
//!
//! The six small HTTP services behind the gateway. Each one is a thin axum
//! router over its own SQLite database; a [`app::ServiceKind`] picks which.
//!
//! ## Modules
//!
//! - `app`: Service kinds, state, router builder and the `run` entry point
//! - `config`: Configuration management
//! - `routes`: HTTP handlers per service
//! - `summary`: Bill and payment aggregation
//! - `billing_client`: Client for the billing service, used by payments
//! - `settlement`: Delayed payment settlement job
//! - `receipt`: PDF receipt rendering

pub mod app;
pub mod billing_client;
pub mod config;
pub mod receipt;
pub mod routes;
pub mod settlement;
pub mod summary;
