//! # Math Service
//!
//! HTTP service exposing three mathematical operations (power, Fibonacci,
//! factorial). Every successful calculation is recorded in a store that also
//! serves history and aggregate statistics.
//!
//! ## Architecture
//!
//! - [`algorithms`]: Pure calculation engine with its own range checks
//! - [`models`]: Calculation records, inputs, results and statistics
//! - [`services`]: Boundary validation and the request pipeline
//! - [`db`]: Repository traits, SQLite and in-memory backends, factory
//! - [`config`]: Server settings from the environment
//! - [`http`]: Axum router, handlers and error envelopes
//!
//! Integer results are exact: Fibonacci and factorial use arbitrary-precision
//! integers and serialize as plain JSON numbers of any length.

// RepositoryError carries rich context for debugging.
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
