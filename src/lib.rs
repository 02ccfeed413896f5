//! # Portfolio API
//!
//! A small record-keeping service: it accepts status check pings and
//! contact form submissions, persists them in a document store, and lets
//! an operator list them and move contact messages between `unread`,
//! `read`, and `archived`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌───────────────┐   ┌──────────┐
//! │   HTTP   │──▶│ ContactService / │──▶│ Collection<R> │──▶│  SQLite  │
//! │  (axum)  │   │ StatusCheckSvc   │   │  (gateway)    │   │ JSON docs│
//! └──────────┘   └──────────────────┘   └───────────────┘   └──────────┘
//!       ▲
//!  ┌────┴─────┐
//!  │   CLI    │
//!  └──────────┘
//! ```
//!
//! The services and the gateway live in `portfolio-core`; this crate adds
//! configuration, the SQLite backend, the HTTP server, and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection pool |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite document store backend |
//! | [`server`] | HTTP server |
//! | [`admin`] | CLI admin commands |

pub mod admin;
pub mod config;
pub mod db;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
