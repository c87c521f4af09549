use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::config::{LedgerConfig, LoanTerms};
use crate::errors::{LedgerError, Result};
use crate::loan::Loan;
use crate::money::Money;
use crate::payments::Payment;
use crate::state::{LedgerSnapshot, LedgerState};
use crate::status::derive_status;
use crate::types::{Caller, CollateralId, LoanId, LoanStatus, Party, Stage};
use crate::views::{CollateralView, LoanView};

/// who is asking and when, fixed for the whole request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Caller,
    pub now: DateTime<Utc>,
}

impl CallContext {
    /// sample the clock once for this request
    pub fn new(caller: Caller, time_provider: &SafeTimeProvider) -> Self {
        Self {
            caller,
            now: time_provider.now(),
        }
    }

    pub fn at(caller: Caller, now: DateTime<Utc>) -> Self {
        Self { caller, now }
    }
}

/// loan ledger
///
/// Mutations run one at a time under the write lock and only for the
/// configured controller. Reads are open to anyone and may run concurrently.
pub struct Ledger {
    config: LedgerConfig,
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// create an empty ledger
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(LedgerState::new()),
        }
    }

    /// rebuild a ledger from a snapshot
    pub fn restore(config: LedgerConfig, snapshot: LedgerSnapshot) -> Result<Self> {
        let loans = snapshot.loans.len();
        let state = LedgerState::restore(snapshot)?;
        info!(ledger = %config.name, loans, "ledger restored from snapshot");
        Ok(Self {
            config,
            state: RwLock::new(state),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// declare a loan, linking it to its collateral bucket when one is given
    pub fn declare(&self, ctx: &CallContext, loan_id: LoanId, terms: &LoanTerms) -> Result<()> {
        self.mutate(ctx, "declare", |state| {
            let loan = state.declare(loan_id, terms, ctx.now)?;
            info!(
                %loan_id,
                collateral_id = ?loan.collateral_id,
                principal = %loan.principal_amount,
                currency = %loan.principal_currency,
                fee = %loan.fee,
                "loan declared"
            );
            Ok(())
        })
    }

    /// bind borrower and lender, moving the loan to full
    pub fn bind_participants(
        &self,
        ctx: &CallContext,
        loan_id: LoanId,
        is_platform: bool,
        borrower: Party,
        lender: Party,
    ) -> Result<()> {
        self.mutate(ctx, "bind_participants", |state| {
            let loan = state.loan_mut(&loan_id).ok_or(LedgerError::NotDeclared {
                loan_id,
                stage: Stage::NotDeclared,
            })?;
            loan.bind_participants(is_platform, borrower, lender)?;
            info!(%loan_id, is_platform, "participants bound");
            Ok(())
        })
    }

    /// record a repayment at the request time
    pub fn record_payment(&self, ctx: &CallContext, loan_id: LoanId, amount: Money) -> Result<()> {
        self.mutate(ctx, "record_payment", |state| {
            let loan = state.loan_mut(&loan_id).ok_or(LedgerError::LoanNotFull {
                loan_id,
                stage: Stage::NotDeclared,
            })?;
            loan.ensure_full()?;
            if loan.is_overdue(ctx.now)? {
                return Err(LedgerError::LoanOverdue {
                    loan_id,
                    due_date: loan.due_date()?,
                });
            }
            // the new total must stay representable
            let total = loan.payments.total_with(amount)?;

            loan.payments.record(amount, ctx.now);
            info!(%loan_id, %amount, %total, count = loan.payments.count(), "payment recorded");
            Ok(())
        })
    }

    /// flag a fully paid loan's collateral as returned
    pub fn mark_withdrawn(&self, ctx: &CallContext, loan_id: LoanId) -> Result<()> {
        self.mutate(ctx, "mark_withdrawn", |state| {
            let loan = state.loan_mut(&loan_id).ok_or(LedgerError::LoanNotFull {
                loan_id,
                stage: Stage::NotDeclared,
            })?;
            loan.mark_withdrawn(ctx.now)?;
            info!(%loan_id, collateral_id = ?loan.collateral_id, "loan withdrawn");
            Ok(())
        })
    }

    pub fn stage(&self, loan_id: &LoanId) -> Stage {
        self.read().stage(loan_id)
    }

    pub fn is_declared(&self, loan_id: &LoanId) -> bool {
        self.stage(loan_id) >= Stage::Declared
    }

    pub fn is_full(&self, loan_id: &LoanId) -> bool {
        self.stage(loan_id) == Stage::Full
    }

    /// owned copy of the loan record
    pub fn loan(&self, loan_id: &LoanId) -> Option<Loan> {
        self.read().loan(loan_id).cloned()
    }

    pub fn status(&self, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<LoanStatus> {
        let now = time_provider.now();
        let state = self.read();
        let loan = state.loan(loan_id).ok_or(LedgerError::LoanNotFull {
            loan_id: *loan_id,
            stage: Stage::NotDeclared,
        })?;
        derive_status(loan, now)
    }

    pub fn is_overdue(&self, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<bool> {
        let now = time_provider.now();
        self.with_loan(loan_id, |loan| loan.is_overdue(now))
    }

    pub fn amount_due(&self, loan_id: &LoanId) -> Result<Money> {
        self.with_loan(loan_id, Loan::amount_due)
    }

    pub fn total_paid(&self, loan_id: &LoanId) -> Result<Money> {
        self.with_loan(loan_id, Loan::total_paid)
    }

    pub fn remaining_due(&self, loan_id: &LoanId) -> Result<Money> {
        self.with_loan(loan_id, Loan::remaining_due)
    }

    pub fn payment_count(&self, loan_id: &LoanId) -> Result<usize> {
        self.with_loan(loan_id, |loan| Ok(loan.payments.count()))
    }

    pub fn payments(&self, loan_id: &LoanId) -> Result<Vec<Payment>> {
        self.with_loan(loan_id, |loan| Ok(loan.payments.to_vec()))
    }

    pub fn due_date(&self, loan_id: &LoanId) -> Result<DateTime<Utc>> {
        self.with_loan(loan_id, Loan::due_date)
    }

    pub fn loans_for(&self, collateral_id: &CollateralId) -> Vec<LoanId> {
        self.read().collateral().loans_for(collateral_id)
    }

    pub fn collateral_count(&self, collateral_id: &CollateralId) -> usize {
        self.read().collateral().count(collateral_id)
    }

    pub fn loan_at(&self, collateral_id: &CollateralId, index: usize) -> Result<LoanId> {
        self.read().collateral().loan_at(collateral_id, index)
    }

    /// status of every loan behind a collateral bucket, in link order;
    /// loans that are not full yet have no status
    pub fn collateral_statuses(
        &self,
        collateral_id: &CollateralId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<(LoanId, Option<LoanStatus>)>> {
        let view = self.collateral_view(collateral_id, time_provider)?;
        Ok(view.loans.into_iter().map(|l| (l.loan_id, l.status)).collect())
    }

    pub fn loan_view(&self, loan_id: &LoanId, time_provider: &SafeTimeProvider) -> Result<LoanView> {
        let now = time_provider.now();
        self.with_loan(loan_id, |loan| LoanView::from_loan(loan, now))
    }

    pub fn collateral_view(
        &self,
        collateral_id: &CollateralId,
        time_provider: &SafeTimeProvider,
    ) -> Result<CollateralView> {
        let now = time_provider.now();
        let state = self.read();
        let loans = state
            .collateral()
            .loans_for(collateral_id)
            .into_iter()
            .map(|loan_id| {
                state.loan(&loan_id).ok_or(LedgerError::NotDeclared {
                    loan_id,
                    stage: Stage::NotDeclared,
                })
            })
            .collect::<Result<Vec<&Loan>>>()?;
        CollateralView::from_loans(*collateral_id, loans, now)
    }

    /// consistent image of the whole ledger
    pub fn snapshot(&self, time_provider: &SafeTimeProvider) -> LedgerSnapshot {
        self.read().snapshot(&self.config.name, time_provider.now())
    }

    fn authorize(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.config.controller {
            return Err(LedgerError::Unauthorized {
                caller: ctx.caller.clone(),
            });
        }
        Ok(())
    }

    /// run a mutating operation: authorize, then apply under the write lock
    ///
    /// Operations validate every precondition before their first write, so a
    /// rejected request leaves the state untouched.
    fn mutate<T>(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        apply: impl FnOnce(&mut LedgerState) -> Result<T>,
    ) -> Result<T> {
        let result = self.authorize(ctx).and_then(|()| apply(&mut self.write()));
        if let Err(e) = &result {
            warn!(operation, caller = %ctx.caller, code = e.code(), error = %e, "request rejected");
        }
        result
    }

    fn with_loan<T>(&self, loan_id: &LoanId, f: impl FnOnce(&Loan) -> Result<T>) -> Result<T> {
        let state = self.read();
        let loan = state.loan(loan_id).ok_or(LedgerError::NotDeclared {
            loan_id: *loan_id,
            stage: Stage::NotDeclared,
        })?;
        f(loan)
    }

    // no write leaves the state half-applied, so a poisoned lock is still consistent
    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
