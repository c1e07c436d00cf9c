use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::form::LoanForm;
use crate::gateway::{GatewayReply, PersistenceGateway, Submission};
use crate::schedule::{AmortizationSchedule, AmortizationScheduler, Installment};
use crate::serialization::{parse_stored_installments, schedule_fields, serialize_schedule, to_payload_json};
use crate::types::{DocumentKind, SessionId};

/// a loan being edited, holding at most one schedule
pub struct LoanSession {
    id: SessionId,
    scheduler: AmortizationScheduler,
    schedule: Option<AmortizationSchedule>,
    events: EventStore,
    time: SafeTimeProvider,
}

impl LoanSession {
    pub fn new(time: SafeTimeProvider) -> Self {
        Self {
            id: Uuid::new_v4(),
            scheduler: AmortizationScheduler::new(),
            schedule: None,
            events: EventStore::new(),
            time,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn schedule(&self) -> Option<&AmortizationSchedule> {
        self.schedule.as_ref()
    }

    pub fn installments(&self) -> &[Installment] {
        self.schedule
            .as_ref()
            .map(|s| s.installments())
            .unwrap_or(&[])
    }

    /// generate a schedule, replacing the previous one.
    ///
    /// On rejection the previous schedule is kept.
    pub fn generate(
        &mut self,
        principal: Money,
        term_count: u32,
        annual_rate: Rate,
        start_date: NaiveDate,
    ) -> Result<&AmortizationSchedule> {
        let schedule = self
            .scheduler
            .generate(principal, term_count, annual_rate, start_date)
            .map_err(|e| {
                warn!(session = %self.id, error = %e, "schedule rejected");
                e
            })?;

        let payment_amount = schedule.payment_amount().unwrap_or(Money::ZERO);
        let first_due_date = schedule
            .installments()
            .first()
            .map(|i| i.due_date)
            .unwrap_or(start_date);

        info!(
            session = %self.id,
            terms = term_count,
            payment = %payment_amount,
            total = %schedule.total_payable,
            "schedule generated"
        );
        self.events.emit(Event::ScheduleGenerated {
            session_id: self.id,
            term_count,
            payment_amount,
            total_payable: schedule.total_payable,
            first_due_date,
            timestamp: self.time.now(),
        });

        Ok(self.schedule.insert(schedule))
    }

    /// parse the loan form and generate from it
    pub fn generate_from_form(&mut self, form: LoanForm<'_>) -> Result<&AmortizationSchedule> {
        let request = form.to_request().map_err(|e| {
            warn!(session = %self.id, error = %e, "loan form rejected");
            e
        })?;
        self.generate(
            request.principal,
            request.term_count,
            request.annual_rate,
            request.start_date,
        )
    }

    /// remove one installment by position. Header totals are left as they
    /// were; check `AmortizationSchedule::totals_are_stale`.
    pub fn remove_installment(&mut self, index: usize) -> Option<Installment> {
        let removed = self.schedule.as_mut()?.remove_installment(index);

        match &removed {
            Some(installment) => {
                info!(session = %self.id, sequence = installment.sequence_number, "installment removed");
                self.events.emit(Event::InstallmentRemoved {
                    session_id: self.id,
                    sequence_number: installment.sequence_number,
                    timestamp: self.time.now(),
                });
            }
            None => debug!(session = %self.id, index, "no installment at index"),
        }

        removed
    }

    /// reopen a saved loan from its installment records
    pub fn restore_from_json(
        &mut self,
        principal: Money,
        annual_rate: Rate,
        start_date: NaiveDate,
        json: &str,
    ) -> Result<()> {
        let installments = parse_stored_installments(json)?;
        let count = installments.len();
        self.schedule = Some(AmortizationSchedule::restore(
            principal,
            annual_rate,
            start_date,
            installments,
        ));
        info!(session = %self.id, installments = count, "loan restored");
        Ok(())
    }

    pub fn submission(&self) -> Result<Submission> {
        let schedule = self
            .schedule
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or(LedgerError::EmptySchedule)?;

        Ok(Submission {
            kind: DocumentKind::Loan,
            fields: schedule_fields(schedule),
            detail: to_payload_json(&serialize_schedule(schedule))?,
        })
    }

    /// hand the schedule to the gateway; the schedule is never changed here
    pub fn submit<G>(&mut self, gateway: &mut G) -> Result<GatewayReply>
    where
        G: PersistenceGateway + ?Sized,
    {
        let submission = self.submission().map_err(|e| {
            warn!(session = %self.id, error = %e, "submission blocked");
            e
        })?;

        match gateway.submit(&submission) {
            Ok(reply) => {
                info!(session = %self.id, msg = %reply.msg, "loan submission accepted");
                self.events.emit(Event::SubmissionAccepted {
                    session_id: self.id,
                    kind: DocumentKind::Loan,
                    message: reply.msg.clone(),
                    timestamp: self.time.now(),
                });
                Ok(reply)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "loan submission rejected");
                self.events.emit(Event::SubmissionRejected {
                    session_id: self.id,
                    kind: DocumentKind::Loan,
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

    pub fn json(&self) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            id: SessionId,
            schedule: Option<&'a AmortizationSchedule>,
            totals_are_stale: bool,
        }

        let snapshot = Snapshot {
            id: self.id,
            schedule: self.schedule.as_ref(),
            totals_are_stale: self.schedule.as_ref().is_some_and(|s| s.totals_are_stale()),
        };

        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::RecordingGateway;
    use crate::types::LoanType;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn session() -> LoanSession {
        LoanSession::new(SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
        )))
    }

    fn jan_31() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn test_generate_emits_event() {
        let mut session = session();
        let schedule = session
            .generate(Money::from_major(1_000), 6, Rate::from_percentage(12), jan_31())
            .unwrap();
        assert_eq!(schedule.len(), 6);

        let events = session.take_events();
        match &events[0] {
            Event::ScheduleGenerated { term_count, payment_amount, total_payable, first_due_date, .. } => {
                assert_eq!(*term_count, 6);
                assert_eq!(*payment_amount, Money::from_decimal(dec!(172.55)));
                assert_eq!(*total_payable, Money::from_decimal(dec!(1035.30)));
                assert_eq!(*first_due_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_regenerate_replaces_schedule() {
        let mut session = session();
        session.generate(Money::from_major(1_200), 12, Rate::ZERO, jan_31()).unwrap();
        session.generate(Money::from_major(600), 3, Rate::ZERO, jan_31()).unwrap();

        assert_eq!(session.installments().len(), 3);
        assert_eq!(session.installments()[0].payment_amount, Money::from_major(200));
    }

    #[test]
    fn test_rejected_generate_keeps_previous_schedule() {
        let mut session = session();
        session.generate(Money::from_major(1_200), 12, Rate::ZERO, jan_31()).unwrap();

        let result = session.generate(Money::ZERO, 12, Rate::ZERO, jan_31());

        assert!(matches!(result, Err(LedgerError::InvalidPrincipal { .. })));
        assert_eq!(session.installments().len(), 12);
        assert_eq!(session.events().len(), 1);
    }

    #[test]
    fn test_generate_from_form() {
        let mut session = session();
        let loan_type = LoanType::new("Vehicle", dec!(12));
        let form = LoanForm {
            principal: "1000",
            term_count: "6",
            loan_type: Some(&loan_type),
            start_date: "2025-01-31",
        };

        let schedule = session.generate_from_form(form).unwrap();
        assert_eq!(schedule.installments()[1].due_date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());

        let bad = LoanForm { start_date: "", ..form };
        assert!(matches!(session.generate_from_form(bad), Err(LedgerError::MissingStartDate)));
    }

    #[test]
    fn test_remove_installment_leaves_totals_stale() {
        let mut session = session();
        session.generate(Money::from_major(1_200), 12, Rate::ZERO, jan_31()).unwrap();

        let removed = session.remove_installment(0).unwrap();
        assert_eq!(removed.sequence_number, 1);

        let schedule = session.schedule().unwrap();
        assert_eq!(schedule.len(), 11);
        assert_eq!(schedule.total_payable, Money::from_major(1_200));
        assert!(schedule.totals_are_stale());
        assert!(matches!(session.events().last(), Some(Event::InstallmentRemoved { sequence_number: 1, .. })));

        assert!(session.remove_installment(40).is_none());
    }

    #[test]
    fn test_remove_without_schedule() {
        let mut session = session();
        assert!(session.remove_installment(0).is_none());
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_empty_schedule_is_not_submitted() {
        let mut session = session();
        let mut gateway = RecordingGateway::accepting("saved");

        assert!(matches!(session.submit(&mut gateway), Err(LedgerError::EmptySchedule)));

        session.generate(Money::from_major(100), 1, Rate::ZERO, jan_31()).unwrap();
        session.remove_installment(0);
        assert!(matches!(session.submit(&mut gateway), Err(LedgerError::EmptySchedule)));
        assert!(gateway.received.is_empty());
    }

    #[test]
    fn test_loan_submission_payload() {
        let mut session = session();
        session
            .generate(Money::from_major(1_000), 6, Rate::from_percentage(12), jan_31())
            .unwrap();

        let mut gateway = RecordingGateway::accepting("Loan saved.");
        let reply = session.submit(&mut gateway).unwrap();
        assert_eq!(reply.msg, "Loan saved.");

        let submission = &gateway.received[0];
        assert_eq!(submission.kind, DocumentKind::Loan);
        assert_eq!(submission.fields["monto_pagar"], "1035.30");

        let detail: Value = serde_json::from_str(&submission.detail).unwrap();
        assert_eq!(detail.as_array().unwrap().len(), 6);
        assert_eq!(detail[5]["numero_cuota"], 6);
        assert_eq!(detail[5]["fecha_vencimiento"], "2025-07-31");
    }

    #[test]
    fn test_rejected_loan_submission_keeps_schedule() {
        let mut session = session();
        session.generate(Money::from_major(1_200), 12, Rate::ZERO, jan_31()).unwrap();
        let before = session.schedule().cloned();

        let mut gateway = RecordingGateway::rejecting("client is required");
        assert!(session.submit(&mut gateway).is_err());

        assert_eq!(session.schedule().cloned(), before);
        assert!(matches!(session.events().last(), Some(Event::SubmissionRejected { kind: DocumentKind::Loan, .. })));
    }

    #[test]
    fn test_restore_from_json() {
        let mut session = session();
        session
            .restore_from_json(
                Money::from_major(200),
                Rate::ZERO,
                jan_31(),
                r#"[
                    {"numero_cuota": 1, "fecha_vencimiento": "2025-02-28", "valor_cuota": 100.0, "saldo_cuota": 0.0},
                    {"numero_cuota": 2, "fecha_vencimiento": "2025-03-31", "valor_cuota": 100.0, "saldo_cuota": 100.0}
                ]"#,
            )
            .unwrap();

        let schedule = session.schedule().unwrap();
        assert_eq!(schedule.total_payable, Money::from_major(200));
        assert_eq!(schedule.outstanding_balance, Money::from_major(100));
        assert!(schedule.total_interest.is_zero());
    }

    #[test]
    fn test_json_snapshot() {
        let mut session = session();
        session.generate(Money::from_major(1_200), 12, Rate::ZERO, jan_31()).unwrap();
        session.remove_installment(3);

        let parsed: Value = serde_json::from_str(&session.json()).unwrap();
        assert_eq!(parsed["totals_are_stale"], true);
    }
}
