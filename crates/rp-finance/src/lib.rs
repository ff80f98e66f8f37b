//! # rp-finance
//!
//! Pure resource-plan logic shared by every surface that shows or edits a
//! plan:
//! - currency conversion
//! - `(cost, rate)` resolution from role and employee reference data
//! - the weekly hours ledger
//! - cost / revenue / margin rollups per line item, plan and opportunity
//! - hours auto-fill patterns
//!
//! Nothing in this crate performs I/O.

pub mod autofill;
pub mod currency;
pub mod ledger;
pub mod rates;
pub mod rollup;

pub use autofill::{auto_fill, AutoFillPattern};
pub use currency::{CurrencyError, CurrencyRates};
pub use ledger::{week_start, weeks_between, LedgerError, WeeklyHoursLedger};
pub use rates::{
    reresolve, resolve_rates, CostSource, RateInputs, RateUpdate, Reference, ResolutionError,
    ResolutionTrigger, ResolvedRates,
};
pub use rollup::{
    rollup_line_item, rollup_opportunity, rollup_plan, Financials, LineItemRollup,
    OpportunityRollup, PlanRollup, RollupError, RollupResult,
};
