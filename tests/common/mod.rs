use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const ORDER_HEADER: [&str; 10] = [
    "affiliation_id",
    "total",
    "installments",
    "order_id",
    "card_number",
    "cvc2",
    "exp_month",
    "exp_year",
    "card_holder_name",
    "category",
];

/// Builds an order row with a fixed card and affiliation.
pub fn order_row(order_id: &str, total: &str, installments: &str, category: &str) -> Vec<String> {
    vec![
        "1234567".to_string(),
        total.to_string(),
        installments.to_string(),
        order_id.to_string(),
        "4111111111111111".to_string(),
        "123".to_string(),
        "05".to_string(),
        "2030".to_string(),
        "JOHN DOE".to_string(),
        category.to_string(),
    ]
}

pub fn write_orders(path: &Path, rows: &[Vec<String>]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    wtr.write_record(ORDER_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}
