/// quick start - build a sale invoice and print its totals
use document_ledger_rs::{InvoiceSession, LineRequest, Money, Product};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut invoice = InvoiceSession::builder().sale().build()?;

    let coffee = Product::new(1, "Coffee 500g", Money::from_decimal(dec!(6.40)), dec!(12)).with_available(30);

    // add two bags, then two more; say yes when asked to merge
    invoice.add(LineRequest::for_product(&coffee, 2), |_| true)?;
    invoice.add(LineRequest::for_product(&coffee, 2), |_| true)?;

    let totals = invoice.totals();
    println!("subtotal: {}", totals.net_subtotal.format_currency());
    println!("iva:      {}", totals.tax_total.format_currency());
    println!("total:    {}", totals.grand_total.format_currency());

    println!("{}", invoice.json());

    Ok(())
}
