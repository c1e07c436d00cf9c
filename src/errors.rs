use thiserror::Error;

use crate::decimal::Money;
use crate::types::ProductId;

#[derive(Error, Debug)]
pub enum LedgerError {
    // line item input
    #[error("no product selected")]
    NoProductSelected,

    #[error("invalid quantity: {raw:?}")]
    InvalidQuantity {
        raw: String,
    },

    #[error("quantity must be greater than zero")]
    QuantityNotPositive,

    #[error("quantity exceeds availability: requested {requested}, available {available}")]
    ExceedsAvailability {
        requested: u32,
        available: u32,
    },

    #[error("invalid unit price: {price}")]
    NegativeUnitPrice {
        price: Money,
    },

    #[error("invalid tax rate: {percent}%")]
    NegativeTaxRate {
        percent: rust_decimal::Decimal,
    },

    #[error("quantity for product {product_id} too large: {existing} + {added}")]
    QuantityOverflow {
        product_id: ProductId,
        existing: u32,
        added: u32,
    },

    #[error("merge conflict for product {product_id} no longer applies")]
    StaleMergeConflict {
        product_id: ProductId,
    },

    // loan input
    #[error("invalid principal: {message}")]
    InvalidPrincipal {
        message: String,
    },

    #[error("invalid number of installments: {message}")]
    InvalidTermCount {
        message: String,
    },

    #[error("invalid interest rate: {message}")]
    InvalidInterestRate {
        message: String,
    },

    #[error("loan start date is required")]
    MissingStartDate,

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    // submission
    #[error("document has no line items to save")]
    EmptyDocument,

    #[error("installments must be generated before saving the loan")]
    EmptySchedule,

    #[error("gateway rejected submission: {message}")]
    GatewayRejected {
        message: String,
    },

    #[error("gateway unavailable: {message}")]
    GatewayUnavailable {
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl LedgerError {
    /// true for rejections caused by what the user typed or selected
    pub fn is_input_rejection(&self) -> bool {
        !matches!(
            self,
            LedgerError::GatewayRejected { .. }
                | LedgerError::GatewayUnavailable { .. }
                | LedgerError::Serialization(_)
                | LedgerError::InvalidConfiguration { .. }
                | LedgerError::StaleMergeConflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
