//! payload records exchanged with the persistence gateway
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::config::{FieldMap, NumberStyle};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::LineEntry;
use crate::schedule::{AmortizationSchedule, Installment};
use crate::types::{ProductId, Totals};

/// one flat line record keyed by the gateway's field names
pub type LineRecord = Map<String, Value>;

/// flatten ledger lines into records, in display order
pub fn serialize_entries(entries: &[LineEntry], fields: &FieldMap) -> Vec<LineRecord> {
    entries.iter().map(|entry| line_record(entry, fields)).collect()
}

fn line_record(entry: &LineEntry, fields: &FieldMap) -> LineRecord {
    let mut record = Map::new();
    record.insert(fields.product.clone(), Value::from(entry.product_id.0));
    record.insert(fields.description.clone(), Value::from(entry.description.clone()));
    record.insert(fields.price.clone(), money_value(entry.unit_price, fields.money_style));
    record.insert(fields.quantity.clone(), quantity_value(entry.quantity, fields.quantity_style));
    record.insert(fields.tax.clone(), money_value(entry.tax_amount, fields.money_style));
    record.insert(fields.line_total.clone(), money_value(entry.line_total, fields.money_style));
    record
}

fn money_value(amount: Money, style: NumberStyle) -> Value {
    let fixed = amount.to_fixed(2);
    match style {
        NumberStyle::FixedString => Value::String(fixed),
        NumberStyle::Numeric => amount
            .round_currency()
            .as_decimal()
            .to_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(fixed)),
    }
}

fn quantity_value(quantity: u32, style: NumberStyle) -> Value {
    match style {
        NumberStyle::Numeric => Value::from(quantity),
        NumberStyle::FixedString => Value::String(quantity.to_string()),
    }
}

/// document totals as two-decimal header fields
pub fn totals_fields(totals: &Totals) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("subtotal".to_string(), totals.net_subtotal.to_fixed(2)),
        ("iva".to_string(), totals.tax_total.to_fixed(2)),
        ("total".to_string(), totals.grand_total.to_fixed(2)),
    ])
}

/// loan header figures as two-decimal fields
pub fn schedule_fields(schedule: &AmortizationSchedule) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("interes".to_string(), schedule.total_interest.to_fixed(2)),
        ("monto_pagar".to_string(), schedule.total_payable.to_fixed(2)),
        ("saldo".to_string(), schedule.outstanding_balance.to_fixed(2)),
    ])
}

/// persisted form of one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentRecord {
    #[serde(rename = "numero_cuota")]
    pub sequence_number: u32,
    #[serde(rename = "fecha_vencimiento")]
    pub due_date: NaiveDate,
    #[serde(rename = "valor_cuota", with = "rust_decimal::serde::float")]
    pub payment_amount: Decimal,
    #[serde(rename = "saldo_cuota", with = "rust_decimal::serde::float")]
    pub outstanding_amount: Decimal,
}

impl From<&Installment> for InstallmentRecord {
    fn from(installment: &Installment) -> Self {
        Self {
            sequence_number: installment.sequence_number,
            due_date: installment.due_date,
            payment_amount: installment.payment_amount.round_currency().as_decimal(),
            outstanding_amount: installment.outstanding_amount.round_currency().as_decimal(),
        }
    }
}

impl From<InstallmentRecord> for Installment {
    fn from(record: InstallmentRecord) -> Self {
        Self {
            sequence_number: record.sequence_number,
            due_date: record.due_date,
            payment_amount: Money::from_decimal(record.payment_amount).round_currency(),
            outstanding_amount: Money::from_decimal(record.outstanding_amount).round_currency(),
        }
    }
}

pub fn serialize_schedule(schedule: &AmortizationSchedule) -> Vec<InstallmentRecord> {
    schedule.installments().iter().map(InstallmentRecord::from).collect()
}

/// a line as the gateway hands it back when a document is reopened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLine {
    pub product: ProductId,
    #[serde(rename = "product__description")]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub iva: Decimal,
}

impl TryFrom<StoredLine> for LineEntry {
    type Error = LedgerError;

    fn try_from(line: StoredLine) -> Result<Self> {
        // stored figures were priced for this exact quantity
        let quantity = Some(line.quantity)
            .filter(|q| q.fract().is_zero())
            .and_then(|q| q.to_u32())
            .filter(|q| *q > 0)
            .ok_or_else(|| LedgerError::InvalidQuantity {
                raw: line.quantity.to_string(),
            })?;

        Ok(Self {
            product_id: line.product,
            description: line.description,
            unit_price: Money::from_decimal(line.price),
            quantity,
            tax_amount: Money::from_decimal(line.iva),
            line_total: Money::from_decimal(line.subtotal),
        })
    }
}

/// parse reopened lines from the gateway's json
pub fn parse_stored_lines(json: &str) -> Result<Vec<LineEntry>> {
    let lines: Vec<StoredLine> = serde_json::from_str(json)?;
    lines.into_iter().map(LineEntry::try_from).collect()
}

/// parse reopened installments from the gateway's json
pub fn parse_stored_installments(json: &str) -> Result<Vec<Installment>> {
    let records: Vec<InstallmentRecord> = serde_json::from_str(json)?;
    Ok(records.into_iter().map(Installment::from).collect())
}

pub fn to_payload_json<T: Serialize>(records: &T) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}
