pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod form;
pub mod gateway;
pub mod ledger;
pub mod schedule;
pub mod serialization;
pub mod session;
pub mod types;

use std::sync::Once;

// re-export key types
pub use config::{DocumentConfig, FieldMap, NumberStyle};
pub use decimal::{Money, Rate};
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use form::{LineItemForm, LoanForm, LoanRequest};
pub use gateway::{GatewayReply, PersistenceGateway, Submission};
pub use ledger::{
    compute_totals, AddOutcome, LineEntry, LineItemLedger, LineRequest, MergeConflict, Resolution,
};
pub use schedule::{AmortizationSchedule, AmortizationScheduler, Installment};
pub use session::{InvoiceSession, InvoiceSessionBuilder, LoanSession};
pub use types::{DocumentKind, LoanType, MergePolicy, Product, ProductId, SessionId, Totals};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

static TRACING_INIT: Once = Once::new();

/// install a fmt subscriber filtered by `RUST_LOG`, once per process
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "document_ledger_rs=info".parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
