//! # rp-core
//!
//! Core types, traits, and utilities for the resource-plan engine.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases
//! - Core traits (Entity, Identifiable)
//! - Shared value types (record ids, currency codes, date ranges, money helpers)
//! - Configuration types

pub mod error;
pub mod traits;
pub mod types;
pub mod config;

pub use error::*;
pub use traits::*;
pub use types::*;
