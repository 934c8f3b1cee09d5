//! # Warden Shared Library
//!
//! This crate contains the credential and authorization core used by the
//! Warden API server: password hashing, bearer tokens, request guards,
//! ownership checks, the credential store contract and the orchestration
//! services built on top of them.
//!
//! ## Module Organization
//!
//! - `config`: Immutable authentication configuration
//! - `error`: Error taxonomy returned by every orchestration operation
//! - `auth`: Hashing, tokens, guards and ownership checks
//! - `models`: Credential records, documents and pagination types
//! - `store`: Persistence contracts with PostgreSQL and in-memory adapters
//! - `services`: Register/login/password flows, user administration, documents
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Warden shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
