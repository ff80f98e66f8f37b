//! Hours auto-fill patterns

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rp_core::types::{round_money, DateRange};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{week_overlaps, week_start, weeks_between, LedgerError};

/// How to spread hours over a line item's weeks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutoFillPattern {
    /// Same hours every week
    Uniform { hours: Decimal },
    /// Linear from `from` in the first week to `to` in the last
    Ramp { from: Decimal, to: Decimal },
    /// Explicit hours per week; keys are normalised to their Sunday
    Custom { weeks: BTreeMap<NaiveDate, Decimal> },
}

/// Hours per Sunday for every week overlapping `range`
pub fn auto_fill(
    pattern: &AutoFillPattern,
    range: DateRange,
) -> Result<BTreeMap<NaiveDate, Decimal>, LedgerError> {
    let weeks = weeks_between(range.start, range.end);

    let filled: BTreeMap<NaiveDate, Decimal> = match pattern {
        AutoFillPattern::Uniform { hours } => weeks.iter().map(|w| (*w, *hours)).collect(),
        AutoFillPattern::Ramp { from, to } => {
            let steps = Decimal::from(weeks.len().saturating_sub(1));
            weeks
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let hours = if steps.is_zero() {
                        *from
                    } else {
                        round_money(*from + (*to - *from) * Decimal::from(i) / steps)
                    };
                    (*w, hours)
                })
                .collect()
        }
        AutoFillPattern::Custom { weeks: custom } => {
            let mut normalised = BTreeMap::new();
            for (date, hours) in custom {
                let week = week_start(*date);
                if week_overlaps(week, &range) {
                    normalised.entry(week).or_insert(*hours);
                }
            }
            normalised
        }
    };

    if let Some((week, hours)) = filled.iter().find(|(_, h)| **h < Decimal::ZERO) {
        return Err(LedgerError::NegativeHours {
            week: *week,
            hours: *hours,
        });
    }
    Ok(filled)
}
