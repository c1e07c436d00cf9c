/// purchase invoice - fixed-string payloads, the replace variant and edit mode
use document_ledger_rs::{
    DocumentConfig, InvoiceSession, LineRequest, Money, Product, ProductId, SafeTimeProvider,
    TimeSource,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cement = Product::new(200, "Cement 50kg", Money::from_decimal(dec!(8.75)), dec!(12));
    let sand = Product::new(201, "Sand m3", Money::from_major(22), dec!(0));

    // purchases write money as "0.00" strings
    let mut purchase = InvoiceSession::builder().purchase().build()?;
    purchase.add(LineRequest::for_product(&cement, 40), |_| true)?;
    purchase.add(LineRequest::for_product(&sand, 3), |_| true)?;
    println!("purchase payload: {}", purchase.submission()?.detail);

    // replace variant: a repeated product overwrites the earlier line
    let mut replacing = InvoiceSession::new(
        DocumentConfig::purchase_replace(),
        SafeTimeProvider::new(TimeSource::System),
    )?;
    replacing.add(LineRequest::for_product(&cement, 40), |_| true)?;
    replacing.add(LineRequest::for_product(&cement, 25), |_| true)?;
    println!("replaced quantity: {}", replacing.entries()[0].quantity);

    // reopen a saved purchase and keep editing it
    let saved = r#"[
        {"product": 200, "product__description": "Cement 50kg", "quantity": 40,
         "price": 8.75, "subtotal": 392.0, "iva": 42.0}
    ]"#;
    let mut reopened = InvoiceSession::builder().purchase().build()?;
    reopened.restore_from_json(saved)?;
    reopened.remove(ProductId(200));
    reopened.add(LineRequest::for_product(&sand, 1), |_| true)?;

    let totals = reopened.totals();
    println!(
        "reopened: {} lines, total {}",
        reopened.entries().len(),
        totals.grand_total.format_currency()
    );

    // config is plain json
    println!("{}", DocumentConfig::purchase().to_json_pretty()?);

    Ok(())
}
