//! roster-core: player profile snapshots, visibility and pagination.
//!
//! Read path, leaves first:
//!
//! - [`history`] keeps the append-only field log per player
//! - [`snapshot`] collapses it to one current value per field key
//! - [`permission`] decides whether a viewer reaches a player
//! - [`visibility`] picks the profile tabs that are authorized and non-empty
//! - [`profile`] ties them together behind [`store::ProfileStore`]
//! - [`cursor`] pages through permission-filtered listings
//!
//! [`db`] is the SQLite-backed store and search endpoints.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` errors at the engine seams
//!   ([`error::ProfileError`], [`error::FetchError`]); `anyhow::Result` in
//!   [`db`] and [`config`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod history;
pub mod model;
pub mod permission;
pub mod profile;
pub mod snapshot;
pub mod store;
pub mod visibility;
