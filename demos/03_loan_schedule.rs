/// loan schedule - generate from form input, delete a row, submit
use document_ledger_rs::chrono::{TimeZone, Utc};
use document_ledger_rs::{
    init_tracing, GatewayReply, LoanForm, LoanSession, LoanType, PersistenceGateway,
    SafeTimeProvider, Submission, TimeSource,
};
use rust_decimal_macros::dec;

struct ConsoleGateway;

impl PersistenceGateway for ConsoleGateway {
    fn submit(&mut self, submission: &Submission) -> document_ledger_rs::Result<GatewayReply> {
        println!("fields: {:?}", submission.fields);
        GatewayReply::from_response(200, r#"{"msg": "Loan saved."}"#)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // a fixed clock keeps event timestamps reproducible
    let start = Utc
        .with_ymd_and_hms(2025, 1, 20, 10, 0, 0)
        .single()
        .ok_or("invalid clock start")?;
    let time = SafeTimeProvider::new(TimeSource::Test(start));
    let mut loan = LoanSession::new(time);

    let personal = LoanType::new("Personal", dec!(12));
    let form = LoanForm {
        principal: "1000",
        term_count: "6",
        loan_type: Some(&personal),
        start_date: "2025-01-31",
    };

    let schedule = loan.generate_from_form(form)?;
    for installment in schedule.installments() {
        println!(
            "#{:<2} {} {:>10}",
            installment.sequence_number,
            installment.due_date,
            installment.payment_amount.format_currency()
        );
    }
    println!(
        "interest {} payable {}",
        schedule.total_interest.format_currency(),
        schedule.total_payable.format_currency()
    );

    // deleting a row leaves the header figures as generated
    loan.remove_installment(5);
    if let Some(schedule) = loan.schedule() {
        println!(
            "{} rows, header still {}, stale: {}",
            schedule.len(),
            schedule.total_payable.format_currency(),
            schedule.totals_are_stale()
        );
    }

    let reply = loan.submit(&mut ConsoleGateway)?;
    println!("{}", reply.msg);

    Ok(())
}
