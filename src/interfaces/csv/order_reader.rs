use crate::domain::order::OrderRecord;
use crate::error::{PaymentError, Result};
use std::io::Read;

/// Batch source of payment orders, one row per card charge.
///
/// Rows carry the affiliation, total, installment count, order id and card
/// data. The trailing `category` column is optional: files may leave it out
/// entirely, and a blank cell means the gateway default applies. A row that
/// fails to deserialize is yielded as an error so the batch can go on.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    /// Surrounding whitespace is trimmed from every cell, and rows may be
    /// one column short when the category is missing.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Consumes the reader; the category stays symbolic until the record is
    /// turned into a `PaymentOrder`.
    pub fn orders(self) -> impl Iterator<Item = Result<OrderRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
