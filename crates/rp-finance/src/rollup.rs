//! Financial rollup
//!
//! ```text
//! total_hours   = sum of hours over the requested weeks that overlap the item's range
//! total_cost    = total_hours * cost
//! total_revenue = total_hours * rate
//! expense       = billable_expense_percentage / 100 * total_revenue
//! margin        = total_revenue - total_cost
//! margin %      = margin / total_revenue * 100                (0 when revenue is 0)
//! margin % exp. = margin / (total_revenue + expense) * 100    (0 when the divisor is 0)
//! ```
//!
//! Plans sum their items and opportunities sum their plans; aggregate margin
//! percentages are recomputed from the summed amounts. Arithmetic is checked:
//! figures too large for a `Decimal` fail with [`RollupError::Overflow`]
//! instead of panicking.

use chrono::NaiveDate;
use rp_core::error::RpError;
use rp_core::types::{round_money, RecordId};
use rp_models::{LineItem, Opportunity, ResourcePlan};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ledger::WeeklyHoursLedger;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RollupError {
    #[error("{figure} is too large to compute")]
    Overflow { figure: &'static str },
}

impl From<RollupError> for RpError {
    fn from(err: RollupError) -> Self {
        match err {
            RollupError::Overflow { figure } => RpError::InvalidNumericInput {
                field: figure.to_string(),
                value: "overflow".to_string(),
            },
        }
    }
}

pub type RollupResult<T> = Result<T, RollupError>;

fn checked(figure: &'static str, value: Option<Decimal>) -> RollupResult<Decimal> {
    value.ok_or(RollupError::Overflow { figure })
}

/// Cost, revenue and margin figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    pub total_hours: Decimal,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
    pub billable_expense_amount: Decimal,
    pub margin_amount: Decimal,
    pub margin_percent_without_expenses: Decimal,
    pub margin_percent_with_expenses: Decimal,
}

impl Financials {
    /// Derive margins from the base amounts
    pub fn from_amounts(
        total_hours: Decimal,
        total_cost: Decimal,
        total_revenue: Decimal,
        billable_expense_amount: Decimal,
    ) -> RollupResult<Self> {
        let margin_amount = checked("margin_amount", total_revenue.checked_sub(total_cost))?;
        let gross = checked(
            "billable_expense_amount",
            total_revenue.checked_add(billable_expense_amount),
        )?;
        Ok(Self {
            total_hours,
            total_cost,
            total_revenue,
            billable_expense_amount,
            margin_amount,
            margin_percent_without_expenses: percent_of(margin_amount, total_revenue)?,
            margin_percent_with_expenses: percent_of(margin_amount, gross)?,
        })
    }

    /// Add the amounts of `other` and recompute margins
    pub fn combine(&self, other: &Financials) -> RollupResult<Self> {
        Self::from_amounts(
            checked("total_hours", self.total_hours.checked_add(other.total_hours))?,
            checked("total_cost", self.total_cost.checked_add(other.total_cost))?,
            checked(
                "total_revenue",
                self.total_revenue.checked_add(other.total_revenue),
            )?,
            checked(
                "billable_expense_amount",
                self.billable_expense_amount
                    .checked_add(other.billable_expense_amount),
            )?,
        )
    }

    /// Combine every figure in `iter`
    pub fn total<'a>(iter: impl IntoIterator<Item = &'a Financials>) -> RollupResult<Self> {
        iter.into_iter()
            .try_fold(Financials::default(), |acc, f| acc.combine(f))
    }
}

fn percent_of(part: Decimal, whole: Decimal) -> RollupResult<Decimal> {
    if whole > Decimal::ZERO {
        let ratio = part
            .checked_div(whole)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
        Ok(round_money(checked("margin_percent", ratio)?))
    } else {
        Ok(Decimal::ZERO)
    }
}

/// Figures for one line item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRollup {
    pub line_item_id: Option<RecordId>,
    pub financials: Financials,
}

/// Figures for an estimate or engagement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRollup {
    pub plan_id: RecordId,
    pub items: Vec<LineItemRollup>,
    pub totals: Financials,
}

/// Figures for an opportunity or quote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityRollup {
    pub opportunity_id: RecordId,
    pub plans: Vec<PlanRollup>,
    pub totals: Financials,
}

/// Roll up one line item over `weeks`
pub fn rollup_line_item(item: &LineItem, weeks: &[NaiveDate]) -> RollupResult<Financials> {
    let ledger = WeeklyHoursLedger::from_line_item(item);
    let total_hours = checked("total_hours", ledger.hours_in_weeks(weeks))?;
    let total_cost = round_money(checked("total_cost", total_hours.checked_mul(item.cost))?);
    let total_revenue = round_money(checked("total_revenue", total_hours.checked_mul(item.rate))?);
    let share = item.billable_expense_percentage / Decimal::ONE_HUNDRED;
    let billable_expense_amount = round_money(checked(
        "billable_expense_amount",
        share.checked_mul(total_revenue),
    )?);

    Financials::from_amounts(total_hours, total_cost, total_revenue, billable_expense_amount)
}

pub fn rollup_plan(plan: &ResourcePlan, weeks: &[NaiveDate]) -> RollupResult<PlanRollup> {
    let items = plan
        .line_items
        .iter()
        .map(|item| -> RollupResult<LineItemRollup> {
            Ok(LineItemRollup {
                line_item_id: item.id.clone(),
                financials: rollup_line_item(item, weeks)?,
            })
        })
        .collect::<RollupResult<Vec<_>>>()?;
    let totals = Financials::total(items.iter().map(|i| &i.financials))?;

    Ok(PlanRollup {
        plan_id: plan.id.clone(),
        items,
        totals,
    })
}

pub fn rollup_opportunity(
    opportunity: &Opportunity,
    weeks: &[NaiveDate],
) -> RollupResult<OpportunityRollup> {
    let plans = opportunity
        .plans
        .iter()
        .map(|plan| rollup_plan(plan, weeks))
        .collect::<RollupResult<Vec<_>>>()?;
    let totals = Financials::total(plans.iter().map(|p| &p.totals))?;

    Ok(OpportunityRollup {
        opportunity_id: opportunity.id.clone(),
        plans,
        totals,
    })
}
