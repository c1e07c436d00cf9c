use serde::{Deserialize, Serialize};

use crate::config::DocumentConfig;
use crate::errors::{LedgerError, Result};
use crate::ledger::compute_totals;
use crate::ledger::entry::{LineEntry, LineRequest};
use crate::ledger::merge::{AddOutcome, MergeConflict, Resolution};
use crate::types::{MergePolicy, ProductId, Totals};

/// priced line items of one document, keyed by product.
///
/// Entries keep insertion order for display. A merged or replaced line is
/// taken out and pushed again, so it moves to the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemLedger {
    merge_policy: MergePolicy,
    enforce_availability: bool,
    entries: Vec<LineEntry>,
}

impl LineItemLedger {
    pub fn new(merge_policy: MergePolicy, enforce_availability: bool) -> Self {
        Self {
            merge_policy,
            enforce_availability,
            entries: Vec::new(),
        }
    }

    pub fn for_config(config: &DocumentConfig) -> Self {
        Self::new(config.merge_policy, config.enforce_availability)
    }

    /// rebuild a ledger from persisted lines; a later duplicate wins
    pub fn restore(mut self, entries: impl IntoIterator<Item = LineEntry>) -> Self {
        for entry in entries {
            self.entries.retain(|e| e.product_id != entry.product_id);
            self.entries.push(entry);
        }
        self
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, product_id: ProductId) -> Option<&LineEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    /// first phase of an add.
    ///
    /// New products are appended right away. A duplicate under the replace
    /// policy swaps the line; under the confirm policy it comes back as a
    /// `Conflict` and the ledger is left as it was.
    pub fn propose_add(&mut self, request: LineRequest) -> Result<AddOutcome> {
        request.validate(self.enforce_availability)?;

        let Some(existing) = self.get(request.product_id).cloned() else {
            let entry = LineEntry::priced(&request);
            self.entries.push(entry.clone());
            return Ok(AddOutcome::Added(entry));
        };

        match self.merge_policy {
            MergePolicy::Replace => {
                let entry = LineEntry::priced(&request);
                self.take(request.product_id);
                self.entries.push(entry.clone());
                Ok(AddOutcome::Replaced {
                    previous: existing,
                    entry,
                })
            }
            MergePolicy::ConfirmAndAccumulate => {
                Ok(AddOutcome::Conflict(MergeConflict { request, existing }))
            }
        }
    }

    /// second phase, the user agreed to merge.
    ///
    /// The line is read again at this point, so a merge confirmed after
    /// other edits folds into the current figures. Fails if the product has
    /// been removed since the conflict was raised.
    pub fn confirm_merge(&mut self, conflict: MergeConflict) -> Result<Resolution> {
        let product_id = conflict.product_id();
        let current = self
            .get(product_id)
            .ok_or(LedgerError::StaleMergeConflict { product_id })?;

        let entry = current.merged_with(&conflict.request)?;
        let previous = self
            .take(product_id)
            .ok_or(LedgerError::StaleMergeConflict { product_id })?;
        self.entries.push(entry.clone());

        Ok(Resolution::Merged { previous, entry })
    }

    /// second phase, the user declined; nothing changes
    pub fn cancel_add(&self, conflict: MergeConflict) -> Resolution {
        Resolution::Declined(conflict)
    }

    /// one-shot add with the merge decision supplied by the caller
    pub fn add<F>(&mut self, request: LineRequest, confirm: F) -> Result<Resolution>
    where
        F: FnOnce(&MergeConflict) -> bool,
    {
        match self.propose_add(request)? {
            AddOutcome::Added(entry) => Ok(Resolution::Added(entry)),
            AddOutcome::Replaced { previous, entry } => Ok(Resolution::Replaced { previous, entry }),
            AddOutcome::Conflict(conflict) => {
                if confirm(&conflict) {
                    self.confirm_merge(conflict)
                } else {
                    Ok(self.cancel_add(conflict))
                }
            }
        }
    }

    /// remove a product's line; absent products are ignored
    pub fn remove(&mut self, product_id: ProductId) -> Option<LineEntry> {
        self.take(product_id)
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.entries)
    }

    fn take(&mut self, product_id: ProductId) -> Option<LineEntry> {
        let index = self.entries.iter().position(|e| e.product_id == product_id)?;
        Some(self.entries.remove(index))
    }
}

impl Default for LineItemLedger {
    fn default() -> Self {
        Self::new(MergePolicy::ConfirmAndAccumulate, true)
    }
}
