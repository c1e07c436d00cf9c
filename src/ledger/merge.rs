use serde::{Deserialize, Serialize};

use crate::ledger::entry::{LineEntry, LineRequest};
use crate::types::ProductId;

/// a pending add that collided with a line already on the ledger.
///
/// Returned by `propose_add`; the caller settles it with `confirm_merge` or
/// `cancel_add` once the user has decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub(crate) request: LineRequest,
    pub(crate) existing: LineEntry,
}

impl MergeConflict {
    pub fn product_id(&self) -> ProductId {
        self.request.product_id
    }

    pub fn description(&self) -> &str {
        &self.request.description
    }

    /// the line as it stood when the conflict was detected
    pub fn existing(&self) -> &LineEntry {
        &self.existing
    }

    pub fn request(&self) -> &LineRequest {
        &self.request
    }

    /// quantity the line would carry if the merge is confirmed, `None` when
    /// it does not fit
    pub fn combined_quantity(&self) -> Option<u32> {
        self.existing.quantity.checked_add(self.request.quantity)
    }

    /// prompt text for the form surface
    pub fn prompt(&self) -> String {
        match self.combined_quantity() {
            Some(quantity) => format!(
                "\"{}\" is already on the document. Update its quantity to {}?",
                self.request.description, quantity
            ),
            None => format!(
                "\"{}\" is already on the document. Add {} more?",
                self.request.description, self.request.quantity
            ),
        }
    }
}

/// result of the first phase of an add
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// new product, appended to the ledger
    Added(LineEntry),
    /// duplicate product under the replace policy
    Replaced {
        previous: LineEntry,
        entry: LineEntry,
    },
    /// duplicate product waiting on a user decision, ledger untouched
    Conflict(MergeConflict),
}

/// final result of a one-shot add
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Added(LineEntry),
    Merged {
        previous: LineEntry,
        entry: LineEntry,
    },
    Replaced {
        previous: LineEntry,
        entry: LineEntry,
    },
    /// the user declined the merge, ledger untouched
    Declined(MergeConflict),
}

impl Resolution {
    /// whether the add collided with an existing line
    pub fn had_conflict(&self) -> bool {
        !matches!(self, Resolution::Added(_))
    }

    /// the line now on the ledger, if the add changed anything
    pub fn entry(&self) -> Option<&LineEntry> {
        match self {
            Resolution::Added(entry)
            | Resolution::Merged { entry, .. }
            | Resolution::Replaced { entry, .. } => Some(entry),
            Resolution::Declined(_) => None,
        }
    }
}
