//! Core types for the checkout service.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{AmountError, AmountPolicy, Currency, MinorUnits, parse_major_amount};
pub use status::*;
