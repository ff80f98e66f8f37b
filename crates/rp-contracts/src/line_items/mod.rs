//! Line item contracts
//!
//! - base: validations shared by create and update
//! - create: new rows inside an estimate or engagement
//! - update: edits to persisted rows

mod base;
mod create;
mod update;

pub use base::LineItemBaseContract;
pub use create::CreateLineItemContract;
pub use update::UpdateLineItemContract;

/// Attributes a line item update may touch
pub const WRITABLE_ATTRIBUTES: &[&str] = &[
    "role_id",
    "employee_id",
    "delivery_center_id",
    "cost",
    "rate",
    "currency",
    "start_date",
    "end_date",
    "billable",
    "billable_expense_percentage",
    "weekly_hours",
];
