use chrono::{DateTime, Utc};
use tracing::debug;

use crate::errors::Result;
use crate::loan::Loan;
use crate::types::LoanStatus;

/// derive the status of a full loan at `now`
///
/// Precedence: withdrawn, overdue, paid, partially paid, signed. The result is
/// never stored; every call recomputes it from the latest payments.
///
/// Loans that have not reached [`Stage::Full`](crate::types::Stage::Full) are
/// rejected with `LoanNotFull` rather than reported as signed.
pub fn derive_status(loan: &Loan, now: DateTime<Utc>) -> Result<LoanStatus> {
    loan.ensure_full()?;

    let status = if loan.is_withdrawn {
        LoanStatus::Withdrawn
    } else {
        let paid = loan.total_paid()?;
        let due = loan.amount_due()?;

        if loan.is_expired(now)? && paid < due {
            LoanStatus::Overdue
        } else if paid >= due {
            LoanStatus::Paid
        } else if !loan.payments.is_empty() {
            LoanStatus::PartiallyPaid
        } else {
            LoanStatus::Signed
        }
    };

    debug!(loan_id = %loan.id, ?status, "derived loan status");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanTerms;
    use crate::errors::LedgerError;
    use crate::money::{Money, Rate};
    use crate::types::{Currency, LoanId, Party, Stage};
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn full_loan() -> Loan {
        let terms = LoanTerms::uncollateralized(
            Money::new(1_000),
            Currency::Eur,
            Duration::days(10),
            Rate::from_bps(500),
        );
        let mut loan = Loan::declare(LoanId::new(), &terms, start());
        loan.bind_participants(true, Party::new(1, "b"), Party::new(2, "l"))
            .unwrap();
        loan
    }

    // (payments, days after start, withdrawn) -> status
    #[rstest]
    #[case(&[], 1, false, LoanStatus::Signed)]
    #[case(&[400], 1, false, LoanStatus::PartiallyPaid)]
    #[case(&[1_000, 50], 1, false, LoanStatus::Paid)]
    #[case(&[2_000], 1, false, LoanStatus::Paid)]
    #[case(&[], 11, false, LoanStatus::Overdue)]
    #[case(&[1_049], 11, false, LoanStatus::Overdue)]
    #[case(&[1_050], 11, false, LoanStatus::Paid)]
    #[case(&[1_050], 11, true, LoanStatus::Withdrawn)]
    #[case(&[], 11, true, LoanStatus::Withdrawn)]
    fn test_status_precedence(
        #[case] payments: &[u128],
        #[case] days: i64,
        #[case] withdrawn: bool,
        #[case] expected: LoanStatus,
    ) {
        let mut loan = full_loan();
        for amount in payments {
            loan.payments.record(Money::new(*amount), start());
        }
        loan.is_withdrawn = withdrawn;

        let now = start() + Duration::days(days);
        assert_eq!(derive_status(&loan, now).unwrap(), expected);
    }

    #[test]
    fn test_due_instant_is_not_overdue() {
        let loan = full_loan();
        let due = loan.due_date().unwrap();
        assert_eq!(derive_status(&loan, due).unwrap(), LoanStatus::Signed);
        assert_eq!(
            derive_status(&loan, due + Duration::seconds(1)).unwrap(),
            LoanStatus::Overdue
        );
    }

    #[test]
    fn test_declared_loan_is_rejected() {
        let terms = LoanTerms::uncollateralized(
            Money::new(1),
            Currency::Usd,
            Duration::days(1),
            Rate::ZERO,
        );
        let loan = Loan::declare(LoanId::new(), &terms, start());
        let err = derive_status(&loan, start()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::LoanNotFull {
                loan_id: loan.id,
                stage: Stage::Declared,
            }
        );
    }
}
