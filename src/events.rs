use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{DocumentKind, ProductId, SessionId};

/// all events that can be emitted by an edit session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // line item events
    LineAdded {
        session_id: SessionId,
        product_id: ProductId,
        quantity: u32,
        line_total: Money,
        timestamp: DateTime<Utc>,
    },
    LineMerged {
        session_id: SessionId,
        product_id: ProductId,
        old_quantity: u32,
        new_quantity: u32,
        line_total: Money,
        timestamp: DateTime<Utc>,
    },
    LineReplaced {
        session_id: SessionId,
        product_id: ProductId,
        old_quantity: u32,
        new_quantity: u32,
        timestamp: DateTime<Utc>,
    },
    MergeDeclined {
        session_id: SessionId,
        product_id: ProductId,
        timestamp: DateTime<Utc>,
    },
    LineRemoved {
        session_id: SessionId,
        product_id: ProductId,
        line_total: Money,
        timestamp: DateTime<Utc>,
    },

    // schedule events
    ScheduleGenerated {
        session_id: SessionId,
        term_count: u32,
        payment_amount: Money,
        total_payable: Money,
        first_due_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InstallmentRemoved {
        session_id: SessionId,
        sequence_number: u32,
        timestamp: DateTime<Utc>,
    },

    // submission events
    SubmissionAccepted {
        session_id: SessionId,
        kind: DocumentKind,
        message: String,
        timestamp: DateTime<Utc>,
    },
    SubmissionRejected {
        session_id: SessionId,
        kind: DocumentKind,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during a session
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
