//! # Portfolio Core
//!
//! Storage-agnostic logic for the portfolio API: entity models, the
//! document store gateway, input validation, and the contact message and
//! status check services.
//!
//! This crate contains no sqlx, axum, or filesystem I/O. Backends plug in
//! through [`store::DocumentStore`]; an in-memory backend ships here for
//! tests and embedding.

pub mod contact;
pub mod error;
pub mod models;
pub mod status_check;
pub mod store;
pub mod validation;
