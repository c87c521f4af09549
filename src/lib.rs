pub mod collateral;
pub mod config;
pub mod errors;
pub mod ledger;
pub mod loan;
pub mod money;
pub mod payments;
pub mod state;
pub mod status;
pub mod types;
pub mod views;

// re-export key types
pub use collateral::{Collateral, CollateralRegistry};
pub use config::{CollateralTerms, LedgerConfig, LoanTerms};
pub use errors::{LedgerError, Result};
pub use ledger::{CallContext, Ledger};
pub use loan::Loan;
pub use money::{amount_due, Money, Rate, PRECISION_BASE};
pub use payments::{Payment, PaymentLedger};
pub use state::{LedgerSnapshot, LedgerState};
pub use status::derive_status;
pub use types::{Caller, CollateralId, Currency, LoanId, LoanStatus, Party, Stage};
pub use views::{CollateralLoanView, CollateralView, LoanView};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use uuid::Uuid;
