use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// unique identifier for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

/// unique identifier for a collateral bucket, a key space separate from loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollateralId(Uuid);

macro_rules! identifier {
    ($name:ident) => {
        impl $name {
            /// random identifier
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            pub const fn from_bytes(bytes: [u8; 16]) -> Self {
                $name(Uuid::from_bytes(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                $name::from_bytes(bytes)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(LoanId);
identifier!(CollateralId);

/// snapshot of a lender or borrower identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    pub id: u64,
    pub name: String,
}

impl Party {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// identity presented by whoever invokes a ledger operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Caller(String);

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Caller(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// currency of a principal or collateral amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Btc,
    Eth,
    Usdt,
    Usdc,
}

impl Currency {
    pub fn ticker(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Btc => "BTC",
            Currency::Eth => "ETH",
            Currency::Usdt => "USDT",
            Currency::Usdc => "USDC",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "BTC" => Ok(Currency::Btc),
            "ETH" => Ok(Currency::Eth),
            "USDT" => Ok(Currency::Usdt),
            "USDC" => Ok(Currency::Usdc),
            other => Err(format!("unknown currency: {}", other)),
        }
    }
}

/// coarse lifecycle phase, only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// no record exists for the id
    NotDeclared,
    /// terms recorded, participants not yet bound
    Declared,
    /// participants bound, accepting payments
    Full,
}

/// status derived on demand from stage, payments, time and withdrawal flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// participants bound, nothing paid yet
    Signed,
    /// at least one payment, amount due not yet reached
    PartiallyPaid,
    /// amount due reached
    Paid,
    /// period elapsed before amount due was reached
    Overdue,
    /// collateral returned after full payment
    Withdrawn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::NotDeclared < Stage::Declared);
        assert!(Stage::Declared < Stage::Full);
    }

    #[test]
    fn test_identifier_key_spaces() {
        let bytes = [7u8; 16];
        let loan = LoanId::from(bytes);
        let collateral = CollateralId::from(bytes);
        assert_eq!(loan.as_bytes(), collateral.as_bytes());
        assert_eq!(loan.to_string(), collateral.to_string());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usdc".parse::<Currency>().unwrap(), Currency::Usdc);
        assert_eq!(Currency::Btc.to_string(), "BTC");
        assert!("XYZ".parse::<Currency>().is_err());

        let json = serde_json::to_string(&Currency::Eth).unwrap();
        assert_eq!(json, "\"ETH\"");
    }
}
