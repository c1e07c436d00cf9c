use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DocumentConfig;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::form::LineItemForm;
use crate::gateway::{GatewayReply, PersistenceGateway, Submission};
use crate::ledger::{AddOutcome, LineEntry, LineItemLedger, LineRequest, MergeConflict, Resolution};
use crate::serialization::{parse_stored_lines, serialize_entries, to_payload_json, totals_fields};
use crate::types::{DocumentKind, ProductId, SessionId, Totals};

/// an invoice being edited.
///
/// Wraps a ledger configured for one document kind and records what the
/// user did to it. The session owns its clock so every event is stamped
/// from the same source.
pub struct InvoiceSession {
    id: SessionId,
    config: DocumentConfig,
    ledger: LineItemLedger,
    events: EventStore,
    time: SafeTimeProvider,
}

impl InvoiceSession {
    pub fn new(config: DocumentConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        let ledger = LineItemLedger::for_config(&config);

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            ledger,
            events: EventStore::new(),
            time,
        })
    }

    pub fn builder() -> InvoiceSessionBuilder {
        InvoiceSessionBuilder::new()
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.config.kind
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn ledger(&self) -> &LineItemLedger {
        &self.ledger
    }

    pub fn entries(&self) -> &[LineEntry] {
        self.ledger.entries()
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    /// first phase of an add; see [`LineItemLedger::propose_add`]
    pub fn propose_add(&mut self, request: LineRequest) -> Result<AddOutcome> {
        let product_id = request.product_id;
        let outcome = self.ledger.propose_add(request).map_err(|e| {
            warn!(session = %self.id, product = %product_id, error = %e, "line rejected");
            e
        })?;

        let now = self.time.now();
        match &outcome {
            AddOutcome::Added(entry) => {
                info!(session = %self.id, product = %entry.product_id, quantity = entry.quantity, "line added");
                self.events.emit(Event::LineAdded {
                    session_id: self.id,
                    product_id: entry.product_id,
                    quantity: entry.quantity,
                    line_total: entry.line_total,
                    timestamp: now,
                });
            }
            AddOutcome::Replaced { previous, entry } => {
                info!(
                    session = %self.id,
                    product = %entry.product_id,
                    old_quantity = previous.quantity,
                    new_quantity = entry.quantity,
                    "line replaced"
                );
                self.events.emit(Event::LineReplaced {
                    session_id: self.id,
                    product_id: entry.product_id,
                    old_quantity: previous.quantity,
                    new_quantity: entry.quantity,
                    timestamp: now,
                });
            }
            AddOutcome::Conflict(conflict) => {
                debug!(session = %self.id, product = %conflict.product_id(), "merge needs confirmation");
            }
        }

        Ok(outcome)
    }

    /// parse the add-product form and propose the result
    pub fn propose_from_form(&mut self, form: LineItemForm<'_>) -> Result<AddOutcome> {
        let request = form.to_request().map_err(|e| {
            warn!(session = %self.id, error = %e, "form rejected");
            e
        })?;
        self.propose_add(request)
    }

    pub fn confirm_merge(&mut self, conflict: MergeConflict) -> Result<Resolution> {
        let product_id = conflict.product_id();
        let resolution = self.ledger.confirm_merge(conflict).map_err(|e| {
            warn!(session = %self.id, product = %product_id, error = %e, "merge failed");
            e
        })?;

        if let Resolution::Merged { previous, entry } = &resolution {
            info!(
                session = %self.id,
                product = %product_id,
                old_quantity = previous.quantity,
                new_quantity = entry.quantity,
                "line merged"
            );
            self.events.emit(Event::LineMerged {
                session_id: self.id,
                product_id,
                old_quantity: previous.quantity,
                new_quantity: entry.quantity,
                line_total: entry.line_total,
                timestamp: self.time.now(),
            });
        }

        Ok(resolution)
    }

    pub fn cancel_add(&mut self, conflict: MergeConflict) -> Resolution {
        debug!(session = %self.id, product = %conflict.product_id(), "merge declined");
        self.events.emit(Event::MergeDeclined {
            session_id: self.id,
            product_id: conflict.product_id(),
            timestamp: self.time.now(),
        });
        self.ledger.cancel_add(conflict)
    }

    /// one-shot add, asking `confirm` when the product is already listed
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

    pub fn remove(&mut self, product_id: ProductId) -> Option<LineEntry> {
        let removed = self.ledger.remove(product_id);

        match &removed {
            Some(entry) => {
                info!(session = %self.id, product = %product_id, "line removed");
                self.events.emit(Event::LineRemoved {
                    session_id: self.id,
                    product_id,
                    line_total: entry.line_total,
                    timestamp: self.time.now(),
                });
            }
            None => debug!(session = %self.id, product = %product_id, "nothing to remove"),
        }

        removed
    }

    /// reopen a saved document from the gateway's detail records.
    ///
    /// Replaces whatever the session held. Stored figures are kept as they
    /// were saved.
    pub fn restore_from_json(&mut self, json: &str) -> Result<()> {
        let entries = parse_stored_lines(json)?;
        let count = entries.len();
        self.ledger = LineItemLedger::for_config(&self.config).restore(entries);
        info!(session = %self.id, lines = count, "document restored");
        Ok(())
    }

    /// the payload the gateway would receive right now
    pub fn submission(&self) -> Result<Submission> {
        let totals = self.totals();
        if !totals.grand_total.is_positive() {
            return Err(LedgerError::EmptyDocument);
        }

        let records = serialize_entries(self.entries(), &self.config.field_map);

        Ok(Submission {
            kind: self.kind(),
            fields: totals_fields(&totals),
            detail: to_payload_json(&records)?,
        })
    }

    /// hand the document to the gateway.
    ///
    /// The ledger is never changed here, so a rejected submission can be
    /// retried after the user fixes whatever the gateway complained about.
    pub fn submit<G>(&mut self, gateway: &mut G) -> Result<GatewayReply>
    where
        G: PersistenceGateway + ?Sized,
    {
        let submission = self.submission().map_err(|e| {
            warn!(session = %self.id, error = %e, "submission blocked");
            e
        })?;

        let kind = submission.kind;
        match gateway.submit(&submission) {
            Ok(reply) => {
                info!(session = %self.id, kind = ?kind, msg = %reply.msg, "submission accepted");
                self.events.emit(Event::SubmissionAccepted {
                    session_id: self.id,
                    kind,
                    message: reply.msg.clone(),
                    timestamp: self.time.now(),
                });
                Ok(reply)
            }
            Err(e) => {
                warn!(session = %self.id, kind = ?kind, error = %e, "submission rejected");
                self.events.emit(Event::SubmissionRejected {
                    session_id: self.id,
                    kind,
                    reason: e.to_string(),
                    timestamp: self.time.now(),
                });
                Err(e)
            }
        }
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// session state as pretty json
    pub fn json(&self) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            id: SessionId,
            kind: DocumentKind,
            entries: &'a [LineEntry],
            totals: Totals,
        }

        let snapshot = Snapshot {
            id: self.id,
            kind: self.kind(),
            entries: self.entries(),
            totals: self.totals(),
        };

        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}

/// builder for invoice sessions
pub struct InvoiceSessionBuilder {
    config: Option<DocumentConfig>,
    time_source: Option<TimeSource>,
}

impl InvoiceSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            time_source: None,
        }
    }

    pub fn config(mut self, config: DocumentConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn sale(self) -> Self {
        self.config(DocumentConfig::sale())
    }

    pub fn purchase(self) -> Self {
        self.config(DocumentConfig::purchase())
    }

    pub fn time_source(mut self, source: TimeSource) -> Self {
        self.time_source = Some(source);
        self
    }

    /// build with the given time source, or system time if none was set
    pub fn build(self) -> Result<InvoiceSession> {
        let config = self.config.ok_or(LedgerError::InvalidConfiguration {
            message: "document configuration required".to_string(),
        })?;
        let source = self.time_source.unwrap_or(TimeSource::System);

        InvoiceSession::new(config, SafeTimeProvider::new(source))
    }
}

impl Default for InvoiceSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::session::tests::RecordingGateway;
    use crate::types::{MergePolicy, Product};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn test_time() -> TimeSource {
        TimeSource::Test(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())
    }

    fn sale_session() -> InvoiceSession {
        InvoiceSession::builder()
            .sale()
            .time_source(test_time())
            .build()
            .unwrap()
    }

    fn rice() -> Product {
        Product::new(4, "Rice 1kg", Money::from_decimal(dec!(1.50)), dec!(15)).with_available(20)
    }

    fn oil() -> Product {
        Product::new(9, "Oil", Money::from_major(4), dec!(0)).with_available(5)
    }

    #[test]
    fn test_builder_requires_config() {
        let result = InvoiceSession::builder().time_source(test_time()).build();
        assert!(matches!(result, Err(LedgerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_loan_config_is_not_an_invoice() {
        let mut config = DocumentConfig::sale();
        config.kind = DocumentKind::Loan;
        let result = InvoiceSession::new(config, SafeTimeProvider::new(test_time()));
        assert!(matches!(result, Err(LedgerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_add_emits_event_with_session_time() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&rice(), 3), |_| true).unwrap();

        let events = session.take_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::LineAdded { session_id, product_id, quantity, timestamp, .. } => {
                assert_eq!(*session_id, session.id());
                assert_eq!(*product_id, ProductId(4));
                assert_eq!(*quantity, 3);
                assert_eq!(*timestamp, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_two_phase_merge() {
        let mut session = sale_session();
        session.propose_add(LineRequest::for_product(&rice(), 2)).unwrap();

        let AddOutcome::Conflict(conflict) = session.propose_add(LineRequest::for_product(&rice(), 3)).unwrap() else {
            panic!("expected a conflict");
        };
        assert_eq!(conflict.combined_quantity(), Some(5));
        assert_eq!(session.entries()[0].quantity, 2);

        let resolution = session.confirm_merge(conflict).unwrap();
        assert!(matches!(resolution, Resolution::Merged { .. }));
        assert_eq!(session.entries()[0].quantity, 5);

        let events = session.take_events();
        assert!(matches!(events.last(), Some(Event::LineMerged { old_quantity: 2, new_quantity: 5, .. })));
    }

    #[test]
    fn test_declined_merge_leaves_ledger() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&rice(), 2), |_| true).unwrap();
        let before = session.ledger().clone();

        let resolution = session.add(LineRequest::for_product(&rice(), 1), |_| false).unwrap();

        assert!(matches!(resolution, Resolution::Declined(_)));
        assert_eq!(session.ledger(), &before);
        assert!(matches!(session.events().last(), Some(Event::MergeDeclined { .. })));
    }

    #[test]
    fn test_merge_after_removal_is_stale() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&rice(), 2), |_| true).unwrap();

        let AddOutcome::Conflict(conflict) = session.propose_add(LineRequest::for_product(&rice(), 1)).unwrap() else {
            panic!("expected a conflict");
        };
        session.remove(ProductId(4));

        let result = session.confirm_merge(conflict);
        assert!(matches!(result, Err(LedgerError::StaleMergeConflict { .. })));
        assert!(session.entries().is_empty());
    }

    #[test]
    fn test_rejections_emit_nothing() {
        let mut session = sale_session();
        let result = session.propose_add(LineRequest::for_product(&oil(), 6));

        assert!(matches!(result, Err(LedgerError::ExceedsAvailability { requested: 6, available: 5 })));
        assert!(session.entries().is_empty());
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_form_adds_line() {
        let mut session = sale_session();
        let product = oil();

        session.propose_from_form(LineItemForm::new(Some(&product), " 2 ")).unwrap();
        assert_eq!(session.entries()[0].quantity, 2);

        let result = session.propose_from_form(LineItemForm::new(None, "2"));
        assert!(matches!(result, Err(LedgerError::NoProductSelected)));
    }

    #[test]
    fn test_replace_policy_session() {
        let mut session = InvoiceSession::builder()
            .config(DocumentConfig::purchase_replace())
            .time_source(test_time())
            .build()
            .unwrap();
        assert_eq!(session.ledger().merge_policy(), MergePolicy::Replace);

        session.add(LineRequest::for_product(&oil(), 2), |_| panic!("no prompt expected")).unwrap();
        session.add(LineRequest::for_product(&oil(), 50), |_| panic!("no prompt expected")).unwrap();

        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.entries()[0].quantity, 50);
        assert!(matches!(session.events().last(), Some(Event::LineReplaced { old_quantity: 2, new_quantity: 50, .. })));
    }

    #[test]
    fn test_remove_unknown_product_is_quiet() {
        let mut session = sale_session();
        assert!(session.remove(ProductId(99)).is_none());
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_empty_document_is_not_submitted() {
        let mut session = sale_session();
        let mut gateway = RecordingGateway::accepting("saved");

        let result = session.submit(&mut gateway);

        assert!(matches!(result, Err(LedgerError::EmptyDocument)));
        assert!(gateway.received.is_empty());
    }

    #[test]
    fn test_sale_submission_payload() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&rice(), 3), |_| true).unwrap();
        session.add(LineRequest::for_product(&oil(), 1), |_| true).unwrap();

        let mut gateway = RecordingGateway::accepting("Invoice saved.");
        let reply = session.submit(&mut gateway).unwrap();
        assert_eq!(reply.msg, "Invoice saved.");

        let submission = &gateway.received[0];
        assert_eq!(submission.kind, DocumentKind::Sale);
        assert_eq!(submission.fields["subtotal"], "8.50");
        assert_eq!(submission.fields["iva"], "0.68");
        assert_eq!(submission.fields["total"], "9.18");

        let detail: Value = serde_json::from_str(&submission.detail).unwrap();
        assert_eq!(detail[0]["id"], 4);
        assert_eq!(detail[0]["quantify"], 3);
        assert_eq!(detail[1]["sub"], 4.0);

        assert!(matches!(session.events().last(), Some(Event::SubmissionAccepted { .. })));
    }

    #[test]
    fn test_rejected_submission_keeps_ledger() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&oil(), 1), |_| true).unwrap();
        let before = session.ledger().clone();

        let mut gateway = RecordingGateway::rejecting("customer is required");
        let err = session.submit(&mut gateway).unwrap_err();

        assert!(matches!(err, LedgerError::GatewayRejected { .. }));
        assert_eq!(session.ledger(), &before);
        assert!(matches!(
            session.events().last(),
            Some(Event::SubmissionRejected { reason, .. }) if reason.contains("customer is required")
        ));
    }

    #[test]
    fn test_purchase_detail_uses_fixed_strings() {
        let mut session = InvoiceSession::builder()
            .purchase()
            .time_source(test_time())
            .build()
            .unwrap();
        session.add(LineRequest::for_product(&oil(), 2), |_| true).unwrap();

        let submission = session.submission().unwrap();
        let detail: Value = serde_json::from_str(&submission.detail).unwrap();

        assert_eq!(detail[0]["product"], 9);
        assert_eq!(detail[0]["subtotal"], "8.00");
        assert_eq!(submission.kind, DocumentKind::Purchase);
    }

    #[test]
    fn test_restore_then_keep_editing() {
        let mut session = sale_session();
        session
            .restore_from_json(
                r#"[{"product": 4, "product__description": "Rice 1kg", "quantity": 3,
                     "price": 1.5, "subtotal": 5.18, "iva": 0.68}]"#,
            )
            .unwrap();

        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.totals().grand_total, Money::from_decimal(dec!(5.18)));

        session.add(LineRequest::for_product(&rice(), 1), |_| true).unwrap();
        assert_eq!(session.entries()[0].quantity, 4);
    }

    #[test]
    fn test_json_snapshot() {
        let mut session = sale_session();
        session.add(LineRequest::for_product(&oil(), 1), |_| true).unwrap();

        let parsed: Value = serde_json::from_str(&session.json()).unwrap();
        assert_eq!(parsed["kind"], "sale");
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 1);
    }
}
