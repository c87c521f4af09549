use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{LedgerError, Result};
use crate::types::{CollateralId, LoanId};

/// loans secured by one pledged asset, in the order they were declared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collateral {
    pub loans: Vec<LoanId>,
}

/// one-to-many index from collateral bucket to the loans it backs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollateralRegistry {
    buckets: HashMap<CollateralId, Collateral>,
}

impl CollateralRegistry {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// append a loan to a bucket, creating the bucket on first use
    pub(crate) fn link(&mut self, collateral_id: CollateralId, loan_id: LoanId) {
        self.buckets
            .entry(collateral_id)
            .or_default()
            .loans
            .push(loan_id);
    }

    pub fn get(&self, collateral_id: &CollateralId) -> Option<&Collateral> {
        self.buckets.get(collateral_id)
    }

    /// loans backed by the bucket, empty for an unknown bucket
    pub fn loans_for(&self, collateral_id: &CollateralId) -> Vec<LoanId> {
        self.buckets
            .get(collateral_id)
            .map(|c| c.loans.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, collateral_id: &CollateralId) -> usize {
        self.buckets
            .get(collateral_id)
            .map(|c| c.loans.len())
            .unwrap_or(0)
    }

    pub fn loan_at(&self, collateral_id: &CollateralId, index: usize) -> Result<LoanId> {
        self.buckets
            .get(collateral_id)
            .and_then(|c| c.loans.get(index).copied())
            .ok_or(LedgerError::IndexOutOfRange {
                collateral_id: *collateral_id,
                index,
                count: self.count(collateral_id),
            })
    }

    pub fn contains(&self, collateral_id: &CollateralId, loan_id: &LoanId) -> bool {
        self.buckets
            .get(collateral_id)
            .map(|c| c.loans.contains(loan_id))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollateralId, &Collateral)> {
        self.buckets.iter()
    }

    /// number of known buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_appends_in_order() {
        let mut registry = CollateralRegistry::new();
        let bucket = CollateralId::new();
        let first = LoanId::new();
        let second = LoanId::new();

        registry.link(bucket, first);
        assert_eq!(registry.count(&bucket), 1);

        registry.link(bucket, second);
        assert_eq!(registry.loans_for(&bucket), vec![first, second]);
        assert_eq!(registry.loan_at(&bucket, 0).unwrap(), first);
        assert_eq!(registry.loan_at(&bucket, 1).unwrap(), second);
        assert!(registry.contains(&bucket, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_loan_at_out_of_range() {
        let mut registry = CollateralRegistry::new();
        let bucket = CollateralId::new();
        registry.link(bucket, LoanId::new());

        let err = registry.loan_at(&bucket, 1).unwrap_err();
        assert_eq!(
            err,
            LedgerError::IndexOutOfRange {
                collateral_id: bucket,
                index: 1,
                count: 1,
            }
        );
    }

    #[test]
    fn test_unknown_bucket_is_empty() {
        let registry = CollateralRegistry::new();
        let bucket = CollateralId::new();
        assert!(registry.loans_for(&bucket).is_empty());
        assert_eq!(registry.count(&bucket), 0);
        assert_eq!(registry.loan_at(&bucket, 0).unwrap_err().code(), "INDEX_OUT_OF_RANGE");
        assert!(registry.is_empty());
    }
}
