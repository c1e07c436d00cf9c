use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{Product, ProductId};

/// one priced line of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEntry {
    pub product_id: ProductId,
    pub description: String,
    pub unit_price: Money,
    pub quantity: u32,
    /// absolute tax in currency, not a percentage
    pub tax_amount: Money,
    /// unit price times quantity plus tax
    pub line_total: Money,
}

impl LineEntry {
    /// price a request as a fresh line
    pub fn priced(request: &LineRequest) -> Self {
        let (tax_amount, line_total) = request.increment();
        Self {
            product_id: request.product_id,
            description: request.description.clone(),
            unit_price: request.unit_price,
            quantity: request.quantity,
            tax_amount,
            line_total,
        }
    }

    /// fold a request into this line.
    ///
    /// Quantities add up, and the request's own tax and total are added on
    /// top of the stored figures. Nothing is re-derived from the combined
    /// quantity, so a line merged at different prices keeps each increment
    /// priced as it was entered. Price and description follow the request.
    pub fn merged_with(&self, request: &LineRequest) -> Result<Self> {
        let quantity = self
            .quantity
            .checked_add(request.quantity)
            .ok_or(LedgerError::QuantityOverflow {
                product_id: self.product_id,
                existing: self.quantity,
                added: request.quantity,
            })?;

        let (tax_increment, total_increment) = request.increment();
        Ok(Self {
            product_id: self.product_id,
            description: request.description.clone(),
            unit_price: request.unit_price,
            quantity,
            tax_amount: self.tax_amount + tax_increment,
            line_total: self.line_total + total_increment,
        })
    }

    /// untaxed part of the line
    pub fn net_amount(&self) -> Money {
        self.line_total - self.tax_amount
    }
}

/// a validated-on-add request to put a product on the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub description: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub tax_rate_percent: Decimal,
    /// availability ceiling supplied by the caller, if stock is tracked
    pub available: Option<u32>,
}

impl LineRequest {
    pub fn new(
        product_id: impl Into<ProductId>,
        description: impl Into<String>,
        unit_price: Money,
        quantity: u32,
        tax_rate_percent: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            description: description.into(),
            unit_price,
            quantity,
            tax_rate_percent,
            available: None,
        }
    }

    pub fn for_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            description: product.description.clone(),
            unit_price: product.unit_price,
            quantity,
            tax_rate_percent: product.tax_rate_percent,
            available: product.available,
        }
    }

    pub fn with_available(mut self, available: u32) -> Self {
        self.available = Some(available);
        self
    }

    /// reject the request before it touches any ledger
    pub fn validate(&self, enforce_availability: bool) -> Result<()> {
        if self.quantity == 0 {
            return Err(LedgerError::QuantityNotPositive);
        }

        if enforce_availability {
            if let Some(available) = self.available {
                if self.quantity > available {
                    return Err(LedgerError::ExceedsAvailability {
                        requested: self.quantity,
                        available,
                    });
                }
            }
        }

        if self.unit_price.is_negative() {
            return Err(LedgerError::NegativeUnitPrice {
                price: self.unit_price,
            });
        }

        if self.tax_rate_percent < Decimal::ZERO {
            return Err(LedgerError::NegativeTaxRate {
                percent: self.tax_rate_percent,
            });
        }

        Ok(())
    }

    /// tax and line total for this request's quantity alone
    pub fn increment(&self) -> (Money, Money) {
        let net = self.unit_price.times(self.quantity);
        let tax = if self.tax_rate_percent > Decimal::ZERO {
            net.percentage(self.tax_rate_percent)
        } else {
            Money::ZERO
        };
        (tax, net + tax)
    }
}
