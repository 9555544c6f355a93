//! # ZHKH API Gateway
//!
//! Single entry point for the back-office frontend: owns the login session
//! and forwards authenticated requests to the services.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `middleware`: Session authentication
//! - `proxy`: Forwarding to the services
//! - `routes`: Gateway's own endpoints
//! - `session`: Tokens, cookies and session stores

pub mod app;
pub mod config;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod session;
