//! # rp-contracts
//!
//! Contract validation for the resource-plan engine.
//!
//! Contracts validate line items before create/update and reference data
//! before it is handed to the rate resolver. Numeric input that fails here
//! never reaches the rollup.

pub mod base;
pub mod line_items;
pub mod roles;

pub use base::*;
