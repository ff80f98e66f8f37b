//! # rp-services
//!
//! Business services for resource-plan line items.
//!
//! - `store`: the line item persistence port and an in-memory implementation
//! - `reference`: read access to roles, employees, delivery centers and rates
//! - `line_items`: contract-checked create / update / delete services
//! - `plans`: plan-wide rate resolution
//! - `save_queue`: debounced, coalescing writes with stale-response detection
//! - `draft_store`: per-row drafts that survive reloads
//! - `editor`: the row editor tying the above together

pub mod draft_store;
pub mod editor;
pub mod line_items;
pub mod plans;
pub mod reference;
pub mod result;
pub mod save_queue;
pub mod store;

pub use result::ServiceResult;
