use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{CompanyPayload, DividendRequest};

/// Input rules shared by the API and the dashboard forms.
///
/// The API only enforces the identity rules (`company_id_is_valid`,
/// `validated_name`). The amount and year rules are form-level checks the
/// dashboard applies before sending a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("company name is required")]
    BlankCompanyName,
    #[error("company ID must be greater than zero (got {0})")]
    InvalidCompanyId(i64),
    #[error("year must be greater than zero (got {0})")]
    InvalidYear(i32),
    #[error("dividend amount must not be negative (got {0})")]
    NegativeAmount(Decimal),
    #[error("dividend yield must not be negative (got {0})")]
    NegativeYield(Decimal),
}

impl CompanyPayload {
    /// Returns the company name as given, rejecting whitespace-only input.
    pub fn validated_name(&self) -> Result<&str, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankCompanyName);
        }
        Ok(&self.name)
    }
}

impl DividendRequest {
    /// Identity check applied by the API on create and update.
    pub fn company_id_is_valid(&self) -> bool {
        self.company_id > 0
    }

    /// Full form validation applied by the dashboard before submitting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.company_id_is_valid() {
            return Err(ValidationError::InvalidCompanyId(self.company_id));
        }
        if self.year <= 0 {
            return Err(ValidationError::InvalidYear(self.year));
        }
        if self.dividend_amount.is_sign_negative() && !self.dividend_amount.is_zero() {
            return Err(ValidationError::NegativeAmount(self.dividend_amount));
        }
        if self.dividend_yield.is_sign_negative() && !self.dividend_yield.is_zero() {
            return Err(ValidationError::NegativeYield(self.dividend_yield));
        }
        Ok(())
    }
}
