pub mod invoice;
pub mod loan;

pub use invoice::{InvoiceSession, InvoiceSessionBuilder};
pub use loan::LoanSession;
