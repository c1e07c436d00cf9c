use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Money, Rate};

/// unique identifier for an edit session
pub type SessionId = uuid::Uuid;

/// catalog identifier of a product, the merge key of a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        ProductId(id)
    }
}

/// document types handled by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// sales invoice
    Sale,
    /// purchase invoice
    Purchase,
    /// installment loan
    Loan,
}

/// what happens when a product already on the ledger is added again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// ask the user, then fold the new quantity into the existing line
    ConfirmAndAccumulate,
    /// drop the existing line and keep the new one, no questions asked
    Replace,
}

/// a selectable product as offered by the form surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub unit_price: Money,
    pub tax_rate_percent: Decimal,
    /// stock ceiling for a single add, `None` when stock is not tracked
    pub available: Option<u32>,
}

impl Product {
    pub fn new(
        id: impl Into<ProductId>,
        description: impl Into<String>,
        unit_price: Money,
        tax_rate_percent: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            unit_price,
            tax_rate_percent,
            available: None,
        }
    }

    pub fn with_available(mut self, available: u32) -> Self {
        self.available = Some(available);
        self
    }
}

/// loan product with its annual rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanType {
    pub description: String,
    pub annual_rate_percent: Decimal,
}

impl LoanType {
    pub fn new(description: impl Into<String>, annual_rate_percent: Decimal) -> Self {
        Self {
            description: description.into(),
            annual_rate_percent,
        }
    }

    pub fn annual_rate(&self) -> Rate {
        Rate::from_percentage_decimal(self.annual_rate_percent)
    }
}

/// derived document totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Totals {
    pub net_subtotal: Money,
    pub tax_total: Money,
    pub grand_total: Money,
}

impl Totals {
    pub fn is_empty(&self) -> bool {
        self.grand_total.is_zero() && self.tax_total.is_zero()
    }
}
