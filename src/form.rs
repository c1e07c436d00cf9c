//! Adapter between the form surface and the engines.
//!
//! The surface hands over raw field text and its current selections; these
//! helpers turn them into typed requests or a user-facing rejection. No
//! engine state is touched here.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::ledger::LineRequest;
use crate::schedule::{parse_iso_date, AmortizationSchedule, AmortizationScheduler};
use crate::types::{LoanType, Product};

/// parse a whole positive count the way the form does: fractions are cut off
pub fn parse_count(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed).map_err(|_| LedgerError::InvalidQuantity {
        raw: raw.to_string(),
    })?;

    let whole = value.trunc();
    if whole <= Decimal::ZERO {
        return Err(LedgerError::QuantityNotPositive);
    }

    whole.to_u32().ok_or_else(|| LedgerError::InvalidQuantity {
        raw: raw.to_string(),
    })
}

/// the "add product" part of an invoice form
#[derive(Debug, Clone, Copy)]
pub struct LineItemForm<'a> {
    pub product: Option<&'a Product>,
    pub quantity: &'a str,
}

impl<'a> LineItemForm<'a> {
    pub fn new(product: Option<&'a Product>, quantity: &'a str) -> Self {
        Self { product, quantity }
    }

    pub fn to_request(&self) -> Result<LineRequest> {
        let product = self.product.ok_or(LedgerError::NoProductSelected)?;
        let quantity = parse_count(self.quantity)?;
        Ok(LineRequest::for_product(product, quantity))
    }
}

/// typed loan terms ready for the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub principal: Money,
    pub term_count: u32,
    pub annual_rate: Rate,
    pub start_date: NaiveDate,
}

impl LoanRequest {
    pub fn generate(&self) -> Result<AmortizationSchedule> {
        AmortizationScheduler::new().generate(
            self.principal,
            self.term_count,
            self.annual_rate,
            self.start_date,
        )
    }
}

/// the header of a loan form
#[derive(Debug, Clone, Copy)]
pub struct LoanForm<'a> {
    pub principal: &'a str,
    pub term_count: &'a str,
    /// selected loan type; no selection means an interest-free loan
    pub loan_type: Option<&'a LoanType>,
    pub start_date: &'a str,
}

impl<'a> LoanForm<'a> {
    pub fn to_request(&self) -> Result<LoanRequest> {
        let principal = Money::from_str_exact(self.principal)
            .ok()
            .filter(|p| p.is_positive())
            .ok_or_else(|| LedgerError::InvalidPrincipal {
                message: format!("{:?} is not an amount greater than zero", self.principal.trim()),
            })?;

        let term_count = parse_count(self.term_count).map_err(|_| LedgerError::InvalidTermCount {
            message: format!("{:?} is not a whole number greater than zero", self.term_count.trim()),
        })?;

        let annual_rate = self.loan_type.map(LoanType::annual_rate).unwrap_or(Rate::ZERO);
        if annual_rate.is_negative() {
            return Err(LedgerError::InvalidInterestRate {
                message: format!("loan type has a negative rate ({})", annual_rate),
            });
        }

        let start_date = parse_iso_date(self.start_date)?;

        Ok(LoanRequest {
            principal,
            term_count,
            annual_rate,
            start_date,
        })
    }
}
