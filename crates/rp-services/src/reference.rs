//! Reference data access
//!
//! Roles, employees and delivery centers arrive asynchronously. A consumer
//! asking before the data has loaded (or for an id the loaded data does not
//! contain) gets [`Reference::Loading`] and defers.

use std::collections::HashMap;

use parking_lot::RwLock;
use rp_core::types::RecordId;
use rp_finance::{CurrencyRates, Reference};
use rp_models::{DeliveryCenterDirectory, Employee, Role};
use tracing::debug;

pub trait ReferenceData: Send + Sync {
    fn role(&self, id: &RecordId) -> Reference<Role>;

    fn employee(&self, id: &RecordId) -> Reference<Employee>;

    fn delivery_centers(&self) -> Reference<DeliveryCenterDirectory>;

    fn currency_rates(&self) -> CurrencyRates;
}

#[derive(Default)]
struct Loaded {
    roles: Option<HashMap<RecordId, Role>>,
    employees: Option<HashMap<RecordId, Employee>>,
    centers: Option<DeliveryCenterDirectory>,
}

/// Reference data held in memory; every collection starts out loading
pub struct InMemoryReferenceData {
    loaded: RwLock<Loaded>,
    rates: RwLock<CurrencyRates>,
}

impl Default for InMemoryReferenceData {
    fn default() -> Self {
        Self::new(CurrencyRates::default())
    }
}

impl InMemoryReferenceData {
    pub fn new(rates: CurrencyRates) -> Self {
        Self {
            loaded: RwLock::new(Loaded::default()),
            rates: RwLock::new(rates),
        }
    }

    /// Everything loaded at once
    pub fn with_data(
        rates: CurrencyRates,
        roles: Vec<Role>,
        employees: Vec<Employee>,
        centers: DeliveryCenterDirectory,
    ) -> Self {
        let data = Self::new(rates);
        data.load_roles(roles);
        data.load_employees(employees);
        data.load_delivery_centers(centers);
        data
    }

    pub fn load_roles(&self, roles: Vec<Role>) {
        debug!(count = roles.len(), "Roles loaded");
        self.loaded.write().roles = Some(roles.into_iter().map(|r| (r.id.clone(), r)).collect());
    }

    pub fn load_employees(&self, employees: Vec<Employee>) {
        debug!(count = employees.len(), "Employees loaded");
        self.loaded.write().employees =
            Some(employees.into_iter().map(|e| (e.id.clone(), e)).collect());
    }

    pub fn load_delivery_centers(&self, centers: DeliveryCenterDirectory) {
        debug!(count = centers.len(), "Delivery centers loaded");
        self.loaded.write().centers = Some(centers);
    }

    pub fn set_currency_rates(&self, rates: CurrencyRates) {
        *self.rates.write() = rates;
    }

    /// Drop everything back to the loading state, as on a refetch
    pub fn invalidate(&self) {
        *self.loaded.write() = Loaded::default();
    }
}

impl ReferenceData for InMemoryReferenceData {
    fn role(&self, id: &RecordId) -> Reference<Role> {
        self.loaded
            .read()
            .roles
            .as_ref()
            .and_then(|roles| roles.get(id).cloned())
            .into()
    }

    fn employee(&self, id: &RecordId) -> Reference<Employee> {
        self.loaded
            .read()
            .employees
            .as_ref()
            .and_then(|employees| employees.get(id).cloned())
            .into()
    }

    fn delivery_centers(&self) -> Reference<DeliveryCenterDirectory> {
        self.loaded.read().centers.clone().into()
    }

    fn currency_rates(&self) -> CurrencyRates {
        self.rates.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_models::DeliveryCenter;

    #[test]
    fn test_starts_loading() {
        let data = InMemoryReferenceData::default();
        assert!(!data.role(&RecordId::from(1)).is_loaded());
        assert!(!data.delivery_centers().is_loaded());
    }

    #[test]
    fn test_load_and_invalidate() {
        let data = InMemoryReferenceData::default();
        data.load_roles(vec![Role::new(1, "Developer", "USD")]);
        data.load_delivery_centers(DeliveryCenterDirectory::new(vec![DeliveryCenter::new(
            1, "NYC", "New York", "USD",
        )]));

        assert!(data.role(&RecordId::from("1")).is_loaded());
        assert!(!data.role(&RecordId::from(2)).is_loaded());
        assert!(data.delivery_centers().is_loaded());

        data.invalidate();
        assert!(!data.role(&RecordId::from(1)).is_loaded());
    }
}
