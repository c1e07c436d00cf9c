pub mod entry;
pub mod line_ledger;
pub mod merge;

use crate::decimal::Money;
use crate::types::Totals;

pub use entry::{LineEntry, LineRequest};
pub use line_ledger::LineItemLedger;
pub use merge::{AddOutcome, MergeConflict, Resolution};

/// derive document totals from stored lines.
///
/// Tax and gross are plain sums of the stored line figures; the net
/// subtotal is gross minus tax, never a sum of unit prices.
pub fn compute_totals(entries: &[LineEntry]) -> Totals {
    let tax_total: Money = entries.iter().map(|e| e.tax_amount).sum();
    let grand_total: Money = entries.iter().map(|e| e.line_total).sum();

    Totals {
        net_subtotal: grand_total - tax_total,
        tax_total,
        grand_total,
    }
}
