pub mod amortization;
pub mod calendar;

pub use amortization::{
    calculate_fixed_payment, AmortizationSchedule, AmortizationScheduler, Installment,
};
pub use calendar::{add_months, parse_iso_date};
