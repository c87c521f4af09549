use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::collateral::CollateralRegistry;
use crate::config::{validate_period, LoanTerms};
use crate::errors::{LedgerError, Result};
use crate::loan::Loan;
use crate::types::{LoanId, Stage};

/// the two keyed maps making up a ledger
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    loans: HashMap<LoanId, Loan>,
    collateral: CollateralRegistry,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan(&self, loan_id: &LoanId) -> Option<&Loan> {
        self.loans.get(loan_id)
    }

    pub(crate) fn loan_mut(&mut self, loan_id: &LoanId) -> Option<&mut Loan> {
        self.loans.get_mut(loan_id)
    }

    /// stage of a loan; unknown ids are not declared
    pub fn stage(&self, loan_id: &LoanId) -> Stage {
        self.loans
            .get(loan_id)
            .map(|loan| loan.stage)
            .unwrap_or(Stage::NotDeclared)
    }

    pub fn collateral(&self) -> &CollateralRegistry {
        &self.collateral
    }

    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.values()
    }

    pub fn loan_count(&self) -> usize {
        self.loans.len()
    }

    /// record a new loan and its collateral link together
    pub fn declare(&mut self, loan_id: LoanId, terms: &LoanTerms, now: DateTime<Utc>) -> Result<&Loan> {
        let stage = self.stage(&loan_id);
        if stage != Stage::NotDeclared {
            return Err(LedgerError::AlreadyDeclared { loan_id, stage });
        }
        terms.validate()?;

        if let Some(collateral_id) = terms.collateral_id() {
            self.collateral.link(collateral_id, loan_id);
        }
        let loan = self
            .loans
            .entry(loan_id)
            .or_insert_with(|| Loan::declare(loan_id, terms, now));
        Ok(loan)
    }

    pub fn snapshot(&self, name: &str, taken_at: DateTime<Utc>) -> LedgerSnapshot {
        let mut loans: Vec<Loan> = self.loans.values().cloned().collect();
        loans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        LedgerSnapshot {
            name: name.to_string(),
            taken_at,
            loans,
            collateral: self.collateral.clone(),
        }
    }

    /// rebuild state from a snapshot, checking the cross-map invariants
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self> {
        snapshot.validate()?;

        let loans = snapshot
            .loans
            .into_iter()
            .map(|loan| (loan.id, loan))
            .collect();

        Ok(Self {
            loans,
            collateral: snapshot.collateral,
        })
    }
}

/// serializable image of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub name: String,
    pub taken_at: DateTime<Utc>,
    pub loans: Vec<Loan>,
    pub collateral: CollateralRegistry,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| corrupt(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| corrupt(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut by_id: HashMap<LoanId, &Loan> = HashMap::new();
        for loan in &self.loans {
            if by_id.insert(loan.id, loan).is_some() {
                return Err(corrupt(format!("loan {} appears twice", loan.id)));
            }
            validate_loan(loan)?;
        }

        let mut linked: HashSet<LoanId> = HashSet::new();
        for (collateral_id, bucket) in self.collateral.iter() {
            for loan_id in &bucket.loans {
                let loan = by_id.get(loan_id).ok_or_else(|| {
                    corrupt(format!("collateral {} links unknown loan {}", collateral_id, loan_id))
                })?;
                if loan.collateral_id != Some(*collateral_id) {
                    return Err(corrupt(format!(
                        "collateral {} links loan {} declared against another bucket",
                        collateral_id, loan_id
                    )));
                }
                if !linked.insert(*loan_id) {
                    return Err(corrupt(format!("loan {} linked more than once", loan_id)));
                }
            }
        }

        for loan in &self.loans {
            if loan.collateral_id.is_some() && !linked.contains(&loan.id) {
                return Err(corrupt(format!("loan {} missing from its collateral bucket", loan.id)));
            }
        }

        Ok(())
    }
}

fn validate_loan(loan: &Loan) -> Result<()> {
    let participants_bound = loan.lender.is_some() && loan.borrower.is_some();
    match loan.stage {
        Stage::NotDeclared => {
            return Err(corrupt(format!("loan {} stored with stage NotDeclared", loan.id)));
        }
        Stage::Declared if loan.lender.is_some() || loan.borrower.is_some() => {
            return Err(corrupt(format!("declared loan {} already has participants", loan.id)));
        }
        Stage::Declared if !loan.payments.is_empty() => {
            return Err(corrupt(format!("declared loan {} has payments", loan.id)));
        }
        Stage::Full if !participants_bound => {
            return Err(corrupt(format!("full loan {} is missing participants", loan.id)));
        }
        _ => {}
    }

    validate_period(loan.period).map_err(|e| corrupt(format!("loan {}: {}", loan.id, e)))?;
    loan.amount_due()
        .map_err(|e| corrupt(format!("loan {}: {}", loan.id, e)))?;

    if loan.collateral_id.is_some() != loan.collateral_amount.is_some()
        || loan.collateral_amount.is_some() != loan.collateral_currency.is_some()
    {
        return Err(corrupt(format!("loan {} has partial collateral terms", loan.id)));
    }

    if loan.is_withdrawn && !loan.is_fully_paid()? {
        return Err(corrupt(format!("loan {} withdrawn before being paid", loan.id)));
    }

    Ok(())
}

fn corrupt(message: String) -> LedgerError {
    LedgerError::CorruptSnapshot { message }
}
