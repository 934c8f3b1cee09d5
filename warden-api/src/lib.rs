//! # Warden API Server Library
//!
//! HTTP surface over the `warden-shared` credential and authorization core.
//!
//! ## Modules
//!
//! - `app`: Application state, route table and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Bearer authentication and role checks
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
