//! serializable read views over ledger records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::loan::Loan;
use crate::money::{Money, Rate};
use crate::status::derive_status;
use crate::types::{CollateralId, Currency, LoanId, LoanStatus, Party, Stage};

/// serializable view of a loan at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub collateral_id: Option<CollateralId>,
    pub stage: Stage,
    /// only present once the loan is full
    pub status: Option<LoanStatus>,
    pub lender: Option<Party>,
    pub borrower: Option<Party>,
    pub is_platform: bool,
    pub is_withdrawn: bool,
    pub financial: FinancialView,
    pub schedule: ScheduleView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialView {
    pub principal_amount: Money,
    pub principal_currency: Currency,
    pub collateral_amount: Option<Money>,
    pub collateral_currency: Option<Currency>,
    pub fee: Rate,
    pub amount_due: Money,
    pub total_paid: Money,
    pub remaining_due: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub created_at: DateTime<Utc>,
    pub period_seconds: i64,
    pub due_date: DateTime<Utc>,
    pub payment_count: usize,
    pub last_payment_at: Option<DateTime<Utc>>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan, now: DateTime<Utc>) -> Result<Self> {
        let status = if loan.is_full() {
            Some(derive_status(loan, now)?)
        } else {
            None
        };

        Ok(LoanView {
            id: loan.id,
            collateral_id: loan.collateral_id,
            stage: loan.stage,
            status,
            lender: loan.lender.clone(),
            borrower: loan.borrower.clone(),
            is_platform: loan.is_platform,
            is_withdrawn: loan.is_withdrawn,
            financial: FinancialView {
                principal_amount: loan.principal_amount,
                principal_currency: loan.principal_currency,
                collateral_amount: loan.collateral_amount,
                collateral_currency: loan.collateral_currency,
                fee: loan.fee,
                amount_due: loan.amount_due()?,
                total_paid: loan.total_paid()?,
                remaining_due: loan.remaining_due()?,
            },
            schedule: ScheduleView {
                created_at: loan.created_at,
                period_seconds: loan.period.num_seconds(),
                due_date: loan.due_date()?,
                payment_count: loan.payments.count(),
                last_payment_at: loan.payments.last().map(|p| p.created_at),
            },
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// a loan as seen from the collateral bucket backing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLoanView {
    pub loan_id: LoanId,
    pub stage: Stage,
    pub status: Option<LoanStatus>,
}

/// serializable view of a collateral bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralView {
    pub collateral_id: CollateralId,
    pub loans: Vec<CollateralLoanView>,
    pub withdrawn_count: usize,
}

impl CollateralView {
    pub fn from_loans<'a, I>(collateral_id: CollateralId, loans: I, now: DateTime<Utc>) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Loan>,
    {
        let loans = loans
            .into_iter()
            .map(|loan| -> Result<CollateralLoanView> {
                let status = if loan.is_full() {
                    Some(derive_status(loan, now)?)
                } else {
                    None
                };
                Ok(CollateralLoanView {
                    loan_id: loan.id,
                    stage: loan.stage,
                    status,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let withdrawn_count = loans
            .iter()
            .filter(|l| l.status == Some(LoanStatus::Withdrawn))
            .count();

        Ok(CollateralView {
            collateral_id,
            loans,
            withdrawn_count,
        })
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanTerms;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_declared_loan_has_no_status() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let terms = LoanTerms::uncollateralized(
            Money::new(2_000),
            Currency::Gbp,
            Duration::days(5),
            Rate::from_bps(1_000),
        );
        let loan = Loan::declare(LoanId::new(), &terms, now);

        let view = LoanView::from_loan(&loan, now).unwrap();
        assert_eq!(view.stage, Stage::Declared);
        assert_eq!(view.status, None);
        assert_eq!(view.financial.amount_due, Money::new(2_200));
        assert_eq!(view.schedule.due_date, now + Duration::days(5));

        let collateral = CollateralView::from_loans(CollateralId::new(), [&loan], now).unwrap();
        assert_eq!(collateral.loans[0].status, None);
        assert_eq!(collateral.withdrawn_count, 0);
    }
}
