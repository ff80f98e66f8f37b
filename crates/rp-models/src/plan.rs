//! Estimates, engagements, opportunities and quotes
//!
//! Estimates and engagements share the same resource-plan shape and differ
//! only in where they sit in the sales cycle; the same holds for
//! opportunities and quotes one level up.

use rp_core::traits::{Entity, Identifiable};
use rp_core::types::{CurrencyCode, RecordId};
use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    #[default]
    Estimate,
    Engagement,
}

impl PlanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanKind::Estimate => "estimate",
            PlanKind::Engagement => "engagement",
        }
    }
}

/// An estimate or engagement and its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePlan {
    pub id: RecordId,

    #[serde(default)]
    pub kind: PlanKind,

    pub name: String,

    /// Invoice (or engagement) delivery center; the context center for rate
    /// resolution
    #[serde(default)]
    pub invoice_center_id: Option<RecordId>,

    /// Currency every line item is resolved into
    pub currency: CurrencyCode,

    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Identifiable for ResourcePlan {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

impl Entity for ResourcePlan {
    const TYPE_NAME: &'static str = "ResourcePlan";
}

impl ResourcePlan {
    pub fn new(
        id: impl Into<RecordId>,
        kind: PlanKind,
        name: impl Into<String>,
        currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            invoice_center_id: None,
            currency: currency.into(),
            line_items: Vec::new(),
        }
    }

    pub fn with_invoice_center(mut self, center_id: impl Into<RecordId>) -> Self {
        self.invoice_center_id = Some(center_id.into());
        self
    }

    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    pub fn line_item(&self, id: &RecordId) -> Option<&LineItem> {
        self.line_items.iter().find(|i| i.id.as_ref() == Some(id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    #[default]
    Opportunity,
    Quote,
}

/// An opportunity or quote grouping several resource plans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: RecordId,

    #[serde(default)]
    pub kind: OpportunityKind,

    pub name: String,

    #[serde(default)]
    pub plans: Vec<ResourcePlan>,
}

impl Identifiable for Opportunity {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

impl Entity for Opportunity {
    const TYPE_NAME: &'static str = "Opportunity";
}

impl Opportunity {
    pub fn new(id: impl Into<RecordId>, kind: OpportunityKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            plans: Vec::new(),
        }
    }

    pub fn with_plan(mut self, plan: ResourcePlan) -> Self {
        self.plans.push(plan);
        self
    }

    pub fn plan(&self, id: &RecordId) -> Option<&ResourcePlan> {
        self.plans.iter().find(|p| p.id == *id)
    }
}
