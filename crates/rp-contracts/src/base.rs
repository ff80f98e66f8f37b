//! Base contract system

use std::collections::BTreeSet;

use rp_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Attributes touched by an update, kept in name order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeTracker {
    changed: BTreeSet<String>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_changed(&mut self, attribute: impl Into<String>) {
        self.changed.insert(attribute.into());
    }

    pub fn is_changed(&self, attribute: &str) -> bool {
        self.changed.contains(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Changed attributes the given contract refuses to write
    pub fn unwritable<'a, T, C>(&'a self, contract: &'a C) -> impl Iterator<Item = &'a str>
    where
        C: Contract<T> + ?Sized,
    {
        self.iter().filter(move |attribute| !contract.is_writable(attribute))
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeTracker {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            changed: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_tracker() {
        let mut tracker = ChangeTracker::new();
        assert!(!tracker.is_changed("cost"));

        tracker.mark_changed("rate");
        tracker.mark_changed("cost");
        assert!(tracker.is_changed("cost"));
        assert!(!tracker.is_changed("currency"));
        assert_eq!(tracker.iter().collect::<Vec<_>>(), vec!["cost", "rate"]);
    }

    struct CostOnly;

    impl Contract<()> for CostOnly {
        fn validate(&self, _entity: &()) -> ValidationResult {
            Ok(())
        }

        fn is_writable(&self, attribute: &str) -> bool {
            attribute == "cost"
        }
    }

    #[test]
    fn test_unwritable() {
        let tracker: ChangeTracker = ["plan_id", "cost", "id"].into_iter().collect();
        let rejected: Vec<_> = tracker.unwritable::<(), _>(&CostOnly).collect();
        assert_eq!(rejected, vec!["id", "plan_id"]);
    }
}
