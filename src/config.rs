use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::money::{amount_due, Money, Rate};
use crate::types::{Caller, CollateralId, Currency};

/// ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub name: String,
    /// the only identity allowed to invoke mutating operations
    pub controller: Caller,
}

impl LedgerConfig {
    pub fn new(name: impl Into<String>, controller: Caller) -> Self {
        Self {
            name: name.into(),
            controller,
        }
    }

    /// load from a json document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json).map_err(invalid)?;
        if config.controller.as_str().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "controller must not be empty".to_string(),
            });
        }
        Ok(config)
    }
}

/// terms a loan is declared with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal_amount: Money,
    pub principal_currency: Currency,
    /// absent for uncollateralized loans
    pub collateral: Option<CollateralTerms>,
    #[serde(with = "period_seconds")]
    pub period: Duration,
    pub fee: Rate,
}

/// collateral pledged against a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralTerms {
    pub collateral_id: CollateralId,
    pub amount: Money,
    pub currency: Currency,
}

impl LoanTerms {
    /// create uncollateralized loan terms
    pub fn uncollateralized(
        principal_amount: Money,
        principal_currency: Currency,
        period: Duration,
        fee: Rate,
    ) -> Self {
        Self {
            principal_amount,
            principal_currency,
            collateral: None,
            period,
            fee,
        }
    }

    /// create loan terms secured by a collateral bucket
    pub fn collateralized(
        principal_amount: Money,
        principal_currency: Currency,
        collateral: CollateralTerms,
        period: Duration,
        fee: Rate,
    ) -> Self {
        Self {
            principal_amount,
            principal_currency,
            collateral: Some(collateral),
            period,
            fee,
        }
    }

    pub fn collateral_id(&self) -> Option<CollateralId> {
        self.collateral.map(|c| c.collateral_id)
    }

    /// check the terms can back a loan
    ///
    /// The period must be a non-negative whole number of seconds and the
    /// amount due must be representable.
    pub fn validate(&self) -> Result<()> {
        validate_period(self.period)?;
        amount_due(self.principal_amount, self.fee)?;
        Ok(())
    }

    /// load from a json document
    pub fn from_json(json: &str) -> Result<Self> {
        let terms: LoanTerms = serde_json::from_str(json).map_err(invalid)?;
        terms.validate()?;
        Ok(terms)
    }
}

pub(crate) fn validate_period(period: Duration) -> Result<()> {
    if period < Duration::zero() {
        return Err(LedgerError::InvalidConfiguration {
            message: format!("period must not be negative, got {}", period),
        });
    }
    if period.subsec_nanos() != 0 {
        return Err(LedgerError::InvalidConfiguration {
            message: format!("period must be whole seconds, got {}", period),
        });
    }
    Ok(())
}

fn invalid(e: serde_json::Error) -> LedgerError {
    LedgerError::InvalidConfiguration {
        message: e.to_string(),
    }
}

/// periods travel as whole seconds
pub(crate) mod period_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(period: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(period.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Duration::try_seconds(seconds)
            .ok_or_else(|| serde::de::Error::custom(format!("period out of range: {}s", seconds)))
    }
}
