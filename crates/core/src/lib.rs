//! Checkout Core - Shared domain types.
//!
//! This crate provides the types shared by the checkout components:
//! - `checkout` - HTTP service that takes payments and persists orders
//! - `cli` - Command-line tools for migrations and catalogue seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, order statuses, payment methods and money amounts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
