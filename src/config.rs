use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::{DocumentKind, MergePolicy};

/// configuration of an invoice-like document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub kind: DocumentKind,
    pub merge_policy: MergePolicy,
    /// reject adds above the product's availability ceiling
    pub enforce_availability: bool,
    pub field_map: FieldMap,
}

/// how a number is written into the gateway payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    /// json number
    Numeric,
    /// two-decimal string, e.g. "12.50"
    FixedString,
}

/// field names the gateway expects for one line record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub product: String,
    pub description: String,
    pub price: String,
    pub quantity: String,
    pub tax: String,
    pub line_total: String,
    pub money_style: NumberStyle,
    pub quantity_style: NumberStyle,
}

impl FieldMap {
    /// sales invoice schema
    pub fn sale() -> Self {
        Self {
            product: "id".to_string(),
            description: "description".to_string(),
            price: "price".to_string(),
            quantity: "quantify".to_string(),
            tax: "iva".to_string(),
            line_total: "sub".to_string(),
            money_style: NumberStyle::Numeric,
            quantity_style: NumberStyle::Numeric,
        }
    }

    /// purchase invoice schema
    pub fn purchase() -> Self {
        Self {
            product: "product".to_string(),
            description: "description".to_string(),
            price: "price".to_string(),
            quantity: "quantity".to_string(),
            tax: "iva".to_string(),
            line_total: "subtotal".to_string(),
            money_style: NumberStyle::FixedString,
            quantity_style: NumberStyle::Numeric,
        }
    }

    pub fn names(&self) -> [&str; 6] {
        [
            self.product.as_str(),
            self.description.as_str(),
            self.price.as_str(),
            self.quantity.as_str(),
            self.tax.as_str(),
            self.line_total.as_str(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        let names = self.names();

        if let Some(blank) = names.iter().position(|n| n.trim().is_empty()) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("field name #{} is blank", blank + 1),
            });
        }

        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(LedgerError::InvalidConfiguration {
                    message: format!("field name {:?} is used twice", name),
                });
            }
        }

        Ok(())
    }
}

impl DocumentConfig {
    /// sales invoice: confirm merges, enforce stock
    pub fn sale() -> Self {
        Self {
            kind: DocumentKind::Sale,
            merge_policy: MergePolicy::ConfirmAndAccumulate,
            enforce_availability: true,
            field_map: FieldMap::sale(),
        }
    }

    /// purchase invoice: confirm merges, enforce stock
    pub fn purchase() -> Self {
        Self {
            kind: DocumentKind::Purchase,
            merge_policy: MergePolicy::ConfirmAndAccumulate,
            enforce_availability: true,
            field_map: FieldMap::purchase(),
        }
    }

    /// purchase invoice where a re-added product replaces its line
    pub fn purchase_replace() -> Self {
        Self {
            kind: DocumentKind::Purchase,
            merge_policy: MergePolicy::Replace,
            enforce_availability: false,
            field_map: FieldMap::purchase(),
        }
    }

    /// preset for a document kind
    pub fn for_kind(kind: DocumentKind) -> Result<Self> {
        match kind {
            DocumentKind::Sale => Ok(Self::sale()),
            DocumentKind::Purchase => Ok(Self::purchase()),
            DocumentKind::Loan => Err(LedgerError::InvalidConfiguration {
                message: "loans have no line item configuration".to_string(),
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind == DocumentKind::Loan {
            return Err(LedgerError::InvalidConfiguration {
                message: "loans have no line item configuration".to_string(),
            });
        }
        self.field_map.validate()
    }
}
