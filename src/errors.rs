use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::money::Money;
use crate::types::{Caller, CollateralId, LoanId, LoanStatus, Stage};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("loan {loan_id} already declared: current stage is {stage:?}")]
    AlreadyDeclared {
        loan_id: LoanId,
        stage: Stage,
    },

    #[error("loan {loan_id} not in declared stage: current stage is {stage:?}")]
    NotDeclared {
        loan_id: LoanId,
        stage: Stage,
    },

    #[error("loan {loan_id} not full: current stage is {stage:?}")]
    LoanNotFull {
        loan_id: LoanId,
        stage: Stage,
    },

    #[error("loan {loan_id} overdue since {due_date}")]
    LoanOverdue {
        loan_id: LoanId,
        due_date: DateTime<Utc>,
    },

    #[error("loan {loan_id} not fully paid: status is {status:?}, paid {paid} of {due}")]
    NotFullyPaid {
        loan_id: LoanId,
        status: LoanStatus,
        paid: Money,
        due: Money,
    },

    #[error("arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        operation: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} out of range for collateral {collateral_id} with {count} loans")]
    IndexOutOfRange {
        collateral_id: CollateralId,
        index: usize,
        count: usize,
    },

    #[error("caller {caller} is not authorized to modify the ledger")]
    Unauthorized {
        caller: Caller,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("corrupt snapshot: {message}")]
    CorruptSnapshot {
        message: String,
    },
}

impl LedgerError {
    /// stable machine-readable code for surfacing the rejection to callers
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AlreadyDeclared { .. } => "ALREADY_DECLARED",
            LedgerError::NotDeclared { .. } => "NOT_DECLARED",
            LedgerError::LoanNotFull { .. } => "LOAN_NOT_FULL",
            LedgerError::LoanOverdue { .. } => "LOAN_OVERDUE",
            LedgerError::NotFullyPaid { .. } => "NOT_FULLY_PAID",
            LedgerError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            LedgerError::DivisionByZero => "DIVISION_BY_ZERO",
            LedgerError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            LedgerError::Unauthorized { .. } => "UNAUTHORIZED",
            LedgerError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            LedgerError::CorruptSnapshot { .. } => "CORRUPT_SNAPSHOT",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
