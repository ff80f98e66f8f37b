//! # rp-models
//!
//! Domain models for the resource-plan engine.
//!
//! Reference data (roles, employees, delivery centers) is read-only from the
//! engine's point of view. Line items, estimates/engagements and
//! opportunities/quotes are the plan side.

pub use rp_core::traits::{Entity, Identifiable, PlanScoped};
pub use rp_core::types::{CurrencyCode, RecordId};

pub mod role;
pub mod employee;
pub mod delivery_center;
pub mod line_item;
pub mod plan;

pub use role::{Role, RoleRate};
pub use employee::Employee;
pub use delivery_center::{DeliveryCenter, DeliveryCenterDirectory};
pub use line_item::{LineItem, WeeklyHour};
pub use plan::{Opportunity, OpportunityKind, PlanKind, ResourcePlan};
