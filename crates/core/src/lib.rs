//! Fitsense Core - Shared domain types.
//!
//! This crate provides the data model used across the fitsense SDK:
//! store products and their sizes, product types with measurement
//! weights, user body profiles, and the recommendation results the
//! SDK publishes to host applications.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! storage. This keeps it lightweight and allows it to be used
//! anywhere (the SDK, host-app glue code, tests).
//!
//! # Modules
//!
//! - [`types`] - Product, size, product type, body profile, order,
//!   recommendation, and localization bundle types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
