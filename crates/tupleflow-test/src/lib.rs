//! Shared test fixtures for TupleFlow crates.
//!
//! This crate provides fact types and brute-force reference scorers.
//! It does NOT depend on `tupleflow-scoring` to avoid circular dependencies.
//!
//! - [`nqueens`] - N-Queens facts and conflict counting
//! - [`shift`] - Shift facts, overlap counting and consecutive-run models
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! tupleflow-test = { workspace = true }
//! ```

pub mod nqueens;
pub mod shift;

pub use nqueens::Queen;
pub use shift::Shift;
