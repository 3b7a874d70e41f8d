//! Checkout order service library.
//!
//! Accepts checkout requests from the storefront, creates Razorpay orders,
//! persists orders and line items, and verifies payment signatures. The
//! binary in `main.rs` wires these pieces to `PostgreSQL` and the live
//! gateway; tests wire them to in-memory doubles.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod razorpay;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;

pub use app::build_router;
