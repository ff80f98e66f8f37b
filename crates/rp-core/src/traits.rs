//! Core traits shared by models and services

use crate::types::RecordId;

/// Trait for entities that have a primary key
pub trait Identifiable {
    fn id(&self) -> Option<&RecordId>;
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
    fn is_new_record(&self) -> bool {
        !self.is_persisted()
    }
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Send + Sync {
    /// Human-readable type name for error messages
    const TYPE_NAME: &'static str;
}

/// Entities that live inside an estimate or engagement
pub trait PlanScoped {
    fn plan_id(&self) -> Option<&RecordId>;
}
