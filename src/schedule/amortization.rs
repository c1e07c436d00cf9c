use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::schedule::calendar::add_months;

/// one due payment of a loan schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub sequence_number: u32,
    pub due_date: NaiveDate,
    pub payment_amount: Money,
    /// amount still owed on this installment, starts at the full payment
    pub outstanding_amount: Money,
}

/// fixed-payment amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_count: u32,
    pub start_date: NaiveDate,
    pub installments: Vec<Installment>,
    /// header figures, fixed when the schedule is generated
    pub total_interest: Money,
    pub total_payable: Money,
    pub outstanding_balance: Money,
}

impl AmortizationSchedule {
    /// generate a payment schedule
    pub fn generate(
        principal: Money,
        term_count: u32,
        annual_rate: Rate,
        start_date: NaiveDate,
    ) -> Result<Self> {
        AmortizationScheduler::new().generate(principal, term_count, annual_rate, start_date)
    }

    /// rebuild a schedule from persisted installments.
    ///
    /// Header figures are summed from the installments as stored.
    pub fn restore(
        principal: Money,
        annual_rate: Rate,
        start_date: NaiveDate,
        installments: Vec<Installment>,
    ) -> Self {
        let total_payable: Money = installments.iter().map(|i| i.payment_amount).sum();
        let outstanding_balance: Money = installments.iter().map(|i| i.outstanding_amount).sum();

        Self {
            principal,
            annual_rate,
            term_count: installments.len() as u32,
            start_date,
            total_interest: total_payable - principal,
            total_payable,
            outstanding_balance,
            installments,
        }
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// installment by its 1-based sequence number
    pub fn get_installment(&self, sequence_number: u32) -> Option<&Installment> {
        self.installments
            .iter()
            .find(|i| i.sequence_number == sequence_number)
    }

    /// fixed payment of the schedule
    pub fn payment_amount(&self) -> Option<Money> {
        self.installments.first().map(|i| i.payment_amount)
    }

    /// drop one installment by position for manual correction.
    ///
    /// Header totals are left as generated and must be treated as stale
    /// afterwards. Out-of-range positions are ignored.
    pub fn remove_installment(&mut self, index: usize) -> Option<Installment> {
        if index < self.installments.len() {
            Some(self.installments.remove(index))
        } else {
            None
        }
    }

    /// sum of the installments as they stand now
    pub fn current_payable(&self) -> Money {
        self.installments.iter().map(|i| i.payment_amount).sum()
    }

    /// whether header totals no longer match the installments
    pub fn totals_are_stale(&self) -> bool {
        self.current_payable() != self.total_payable
    }
}

/// turns principal, term and rate into a fixed-payment schedule
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationScheduler;

impl AmortizationScheduler {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        principal: Money,
        term_count: u32,
        annual_rate: Rate,
        start_date: NaiveDate,
    ) -> Result<AmortizationSchedule> {
        validate_terms(principal, term_count, annual_rate)?;

        let monthly_rate = annual_rate.monthly_rate().as_decimal();
        let payment = calculate_fixed_payment(principal, monthly_rate, term_count).round_currency();

        let mut installments = Vec::with_capacity(term_count as usize);
        for i in 1..=term_count {
            installments.push(Installment {
                sequence_number: i,
                due_date: add_months(start_date, i)?,
                payment_amount: payment,
                outstanding_amount: payment,
            });
        }

        let total_payable: Money = installments.iter().map(|i| i.payment_amount).sum();

        Ok(AmortizationSchedule {
            principal,
            annual_rate,
            term_count,
            start_date,
            installments,
            total_interest: total_payable - principal,
            total_payable,
            outstanding_balance: total_payable,
        })
    }
}

fn validate_terms(principal: Money, term_count: u32, annual_rate: Rate) -> Result<()> {
    if !principal.is_positive() {
        return Err(LedgerError::InvalidPrincipal {
            message: format!("{} must be greater than zero", principal),
        });
    }

    if term_count == 0 {
        return Err(LedgerError::InvalidTermCount {
            message: "at least one installment is required".to_string(),
        });
    }

    if annual_rate.is_negative() {
        return Err(LedgerError::InvalidInterestRate {
            message: format!("{} is negative", annual_rate),
        });
    }

    Ok(())
}

/// unrounded fixed payment.
///
/// payment = P * r / (1 - (1 + r)^-n), or P / n without interest
pub fn calculate_fixed_payment(principal: Money, monthly_rate: Decimal, months: u32) -> Money {
    if months == 0 {
        return principal;
    }

    if monthly_rate.is_zero() {
        return principal / Decimal::from(months);
    }

    let base = Decimal::ONE + monthly_rate;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        match compound.checked_mul(base) {
            Some(next) => compound = next,
            // (1 + r)^-n has vanished
            None => return principal * monthly_rate,
        }
    }

    let discount = Decimal::ONE - Decimal::ONE / compound;
    Money::from_decimal(principal.as_decimal() * monthly_rate / discount)
}
