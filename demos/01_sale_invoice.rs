/// sale invoice - two-phase adds, a declined merge and a submission
use document_ledger_rs::{
    init_tracing, AddOutcome, GatewayReply, InvoiceSession, LedgerError, LineItemForm, Money,
    PersistenceGateway, Product, Submission,
};
use rust_decimal_macros::dec;

/// prints the payload instead of sending it anywhere
struct ConsoleGateway;

impl PersistenceGateway for ConsoleGateway {
    fn submit(&mut self, submission: &Submission) -> document_ledger_rs::Result<GatewayReply> {
        println!("fields: {:?}", submission.fields);
        println!("detail: {}", submission.detail);
        GatewayReply::from_response(200, r#"{"msg": "Sale saved.", "url": "/sales/"}"#)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let catalog = vec![
        Product::new(10, "Printer paper A4", Money::from_decimal(dec!(4.25)), dec!(12)).with_available(40),
        Product::new(11, "Stapler", Money::from_decimal(dec!(7.90)), dec!(12)).with_available(3),
        Product::new(12, "Bread", Money::from_decimal(dec!(0.80)), dec!(0)),
    ];

    let mut invoice = InvoiceSession::builder().sale().build()?;

    // raw form input, as the surface hands it over
    for (index, quantity) in [(0, "5"), (1, "2"), (2, "10")] {
        invoice.propose_from_form(LineItemForm::new(catalog.get(index), quantity))?;
    }

    // the stapler ceiling is 3
    match invoice.propose_from_form(LineItemForm::new(catalog.get(1), "4")) {
        Err(LedgerError::ExceedsAvailability { requested, available }) => {
            println!("rejected: asked for {} staplers, {} available", requested, available);
        }
        other => println!("unexpected: {:?}", other.map(|_| ())),
    }

    // paper again: the user is asked, says yes
    if let AddOutcome::Conflict(conflict) = invoice.propose_from_form(LineItemForm::new(catalog.get(0), "3"))? {
        println!("{}", conflict.prompt());
        invoice.confirm_merge(conflict)?;
    }

    // bread again: the user says no
    if let AddOutcome::Conflict(conflict) = invoice.propose_from_form(LineItemForm::new(catalog.get(2), "1"))? {
        println!("{}", conflict.prompt());
        invoice.cancel_add(conflict);
    }

    for entry in invoice.entries() {
        println!(
            "{:>4} {:<20} x{:<3} iva {:>8} total {:>8}",
            entry.product_id,
            entry.description,
            entry.quantity,
            entry.tax_amount.format_currency(),
            entry.line_total.format_currency()
        );
    }

    let reply = invoice.submit(&mut ConsoleGateway)?;
    println!("{} -> {}", reply.msg, reply.url.unwrap_or_default());

    for event in invoice.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
