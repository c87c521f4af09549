use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::money::Money;

/// a single repayment, immutable once recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

/// append-only payment history of one loan, in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentLedger {
    payments: Vec<Payment>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self {
            payments: Vec::new(),
        }
    }

    /// append a payment
    ///
    /// Callers check the loan-level preconditions (stage, overdue) first; the
    /// ledger itself only guarantees append-only ordering.
    pub fn record(&mut self, amount: Money, created_at: DateTime<Utc>) {
        self.payments.push(Payment { amount, created_at });
    }

    /// sum of all recorded amounts
    pub fn total_paid(&self) -> Result<Money> {
        Money::sum(self.payments.iter().map(|p| p.amount))
    }

    /// total after a prospective payment, without recording it
    pub fn total_with(&self, amount: Money) -> Result<Money> {
        self.total_paid()?.checked_add(amount)
    }

    pub fn count(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Payment> {
        self.payments.get(index)
    }

    pub fn last(&self) -> Option<&Payment> {
        self.payments.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Payment> {
        self.payments.iter()
    }

    /// owned copy of the history
    pub fn to_vec(&self) -> Vec<Payment> {
        self.payments.clone()
    }
}
