//! Delivery center model and lookup directory

use rp_core::traits::{Entity, Identifiable};
use rp_core::types::{CurrencyCode, RecordId};
use serde::{Deserialize, Serialize};

/// Organisational/cost-accounting unit. Acts both as the invoice center of an
/// estimate or engagement and as the payable center of a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryCenter {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    pub default_currency: CurrencyCode,
}

impl Identifiable for DeliveryCenter {
    fn id(&self) -> Option<&RecordId> {
        Some(&self.id)
    }
}

impl Entity for DeliveryCenter {
    const TYPE_NAME: &'static str = "DeliveryCenter";
}

impl DeliveryCenter {
    pub fn new(
        id: impl Into<RecordId>,
        code: impl Into<String>,
        name: impl Into<String>,
        default_currency: impl Into<CurrencyCode>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            default_currency: default_currency.into(),
        }
    }
}

/// Maps delivery center code <-> id <-> name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryCenterDirectory {
    centers: Vec<DeliveryCenter>,
}

impl DeliveryCenterDirectory {
    pub fn new(centers: Vec<DeliveryCenter>) -> Self {
        Self { centers }
    }

    pub fn insert(&mut self, center: DeliveryCenter) {
        self.centers.retain(|c| c.id != center.id);
        self.centers.push(center);
    }

    pub fn by_id(&self, id: &RecordId) -> Option<&DeliveryCenter> {
        self.centers.iter().find(|c| c.id == *id)
    }

    /// Codes compare case-insensitively, ignoring surrounding whitespace
    pub fn by_code(&self, code: &str) -> Option<&DeliveryCenter> {
        let code = code.trim();
        self.centers
            .iter()
            .find(|c| c.code.trim().eq_ignore_ascii_case(code))
    }

    pub fn id_for_code(&self, code: &str) -> Option<&RecordId> {
        self.by_code(code).map(|c| &c.id)
    }

    pub fn name_for_id(&self, id: &RecordId) -> Option<&str> {
        self.by_id(id).map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeliveryCenter> {
        self.centers.iter()
    }
}
