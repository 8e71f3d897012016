use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A company dividends are tracked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// Body accepted when adding or updating a company.
///
/// `id` is ignored on add and must match the path identifier on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl CompanyPayload {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

/// A single dividend record for a company and year.
///
/// Amounts are exact decimals and travel over JSON as numbers with their
/// original digits, so `1.50` is never rewritten as `1.5`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    pub id: i64,
    pub company_id: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub dividend_amount: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub dividend_yield: Decimal,
    pub year: i32,
}

impl Dividend {
    /// Builds the entity the server persisted for `request` under `id`.
    pub fn from_request(id: i64, request: &DividendRequest) -> Self {
        Self {
            id,
            company_id: request.company_id,
            dividend_amount: request.dividend_amount,
            dividend_yield: request.dividend_yield,
            year: request.year,
        }
    }
}

/// Body accepted when adding or updating a dividend. Carries no identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividendRequest {
    pub company_id: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub dividend_amount: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub dividend_yield: Decimal,
    pub year: i32,
}

/// Response to a successful create, carrying the generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Created {
    pub fn new(id: i64) -> Self {
        Self { id, message: None }
    }

    pub fn with_message(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            message: Some(message.into()),
        }
    }
}

/// Plain success acknowledgement returned by company mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

impl Acknowledgement {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
