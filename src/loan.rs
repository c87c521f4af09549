use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{period_seconds, LoanTerms};
use crate::errors::{LedgerError, Result};
use crate::money::{amount_due, Money, Rate};
use crate::payments::PaymentLedger;
use crate::status::derive_status;
use crate::types::{CollateralId, Currency, LoanId, LoanStatus, Party, Stage};

/// loan record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // identification
    pub id: LoanId,
    pub collateral_id: Option<CollateralId>,

    // participants, bound once on the declared -> full transition
    pub lender: Option<Party>,
    pub borrower: Option<Party>,
    pub is_platform: bool,

    // terms
    pub principal_amount: Money,
    pub principal_currency: Currency,
    pub collateral_amount: Option<Money>,
    pub collateral_currency: Option<Currency>,
    #[serde(with = "period_seconds")]
    pub period: Duration,
    pub fee: Rate,

    // lifecycle
    pub stage: Stage,
    pub is_withdrawn: bool,
    pub payments: PaymentLedger,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// create a declared loan from its terms
    pub fn declare(id: LoanId, terms: &LoanTerms, now: DateTime<Utc>) -> Self {
        Self {
            id,
            collateral_id: terms.collateral_id(),
            lender: None,
            borrower: None,
            is_platform: false,
            principal_amount: terms.principal_amount,
            principal_currency: terms.principal_currency,
            collateral_amount: terms.collateral.map(|c| c.amount),
            collateral_currency: terms.collateral.map(|c| c.currency),
            period: terms.period,
            fee: terms.fee,
            stage: Stage::Declared,
            is_withdrawn: false,
            payments: PaymentLedger::new(),
            created_at: now,
        }
    }

    /// bind lender and borrower, the single declared -> full transition
    pub fn bind_participants(&mut self, is_platform: bool, borrower: Party, lender: Party) -> Result<()> {
        if self.stage != Stage::Declared {
            return Err(LedgerError::NotDeclared {
                loan_id: self.id,
                stage: self.stage,
            });
        }

        self.is_platform = is_platform;
        self.borrower = Some(borrower);
        self.lender = Some(lender);
        self.stage = Stage::Full;
        Ok(())
    }

    /// flag the collateral as returned; only a paid loan qualifies
    pub fn mark_withdrawn(&mut self, now: DateTime<Utc>) -> Result<()> {
        let status = derive_status(self, now)?;
        if status != LoanStatus::Paid {
            return Err(LedgerError::NotFullyPaid {
                loan_id: self.id,
                status,
                paid: self.total_paid()?,
                due: self.amount_due()?,
            });
        }

        self.is_withdrawn = true;
        Ok(())
    }

    pub fn amount_due(&self) -> Result<Money> {
        amount_due(self.principal_amount, self.fee)
    }

    pub fn total_paid(&self) -> Result<Money> {
        self.payments.total_paid()
    }

    /// amount still owed, zero once the amount due is reached
    pub fn remaining_due(&self) -> Result<Money> {
        Ok(self.amount_due()?.saturating_sub(self.total_paid()?))
    }

    /// instant after which an unpaid loan is overdue
    pub fn due_date(&self) -> Result<DateTime<Utc>> {
        self.created_at
            .checked_add_signed(self.period)
            .ok_or(LedgerError::ArithmeticOverflow { operation: "due_date" })
    }

    /// period has elapsed, regardless of payments
    pub fn is_expired(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(now > self.due_date()?)
    }

    pub fn is_fully_paid(&self) -> Result<bool> {
        Ok(self.total_paid()? >= self.amount_due()?)
    }

    /// period has elapsed without the amount due being reached
    pub fn is_overdue(&self, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.is_expired(now)? && !self.is_fully_paid()?)
    }

    /// declared at some point, whatever the current stage
    pub fn is_declared(&self) -> bool {
        self.stage >= Stage::Declared
    }

    pub fn is_full(&self) -> bool {
        self.stage == Stage::Full
    }

    pub fn ensure_full(&self) -> Result<()> {
        if !self.is_full() {
            return Err(LedgerError::LoanNotFull {
                loan_id: self.id,
                stage: self.stage,
            });
        }
        Ok(())
    }
}
