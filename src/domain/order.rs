use super::card::{CardDetails, CardNumber};
use super::category::TransactionCategory;
use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Everything the caller supplies to open a payment attempt.
#[derive(Debug, Clone)]
pub struct PaymentOrder {
    pub affiliation_id: String,
    pub total: Decimal,
    pub installments: u32,
    pub order_id: String,
    pub card: CardDetails,
    pub category: Option<TransactionCategory>,
}

/// A payment order as it appears in a batch file, category still symbolic.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderRecord {
    pub affiliation_id: String,
    pub total: Decimal,
    pub installments: u32,
    pub order_id: String,
    pub card_number: String,
    pub cvc2: String,
    pub exp_month: String,
    pub exp_year: String,
    pub card_holder_name: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl TryFrom<OrderRecord> for PaymentOrder {
    type Error = PaymentError;

    fn try_from(record: OrderRecord) -> Result<Self, Self::Error> {
        let category = TransactionCategory::parse_optional(record.category.as_deref())?;

        Ok(Self {
            affiliation_id: record.affiliation_id,
            total: record.total,
            installments: record.installments,
            order_id: record.order_id,
            card: CardDetails {
                number: CardNumber::new(record.card_number),
                cvc2: record.cvc2,
                exp_month: record.exp_month,
                exp_year: record.exp_year,
                holder_name: record.card_holder_name,
            },
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const HEADER: &str = "affiliation_id, total, installments, order_id, card_number, cvc2, exp_month, exp_year, card_holder_name, category";

    fn read(row: &str) -> OrderRecord {
        let csv = format!("{HEADER}\n{row}");
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());
        let mut iter = reader.deserialize();

        iter.next()
            .unwrap()
            .expect("Failed to deserialize order")
    }

    #[test]
    fn test_order_deserialization() {
        let record = read("1234567, 150.00, 3, order-1, 4111111111111111, 123, 05, 2030, JOHN DOE, customer");
        assert_eq!(record.total, dec!(150.00));
        assert_eq!(record.installments, 3);
        assert_eq!(record.category.as_deref(), Some("customer"));

        let order = PaymentOrder::try_from(record).unwrap();
        assert_eq!(order.category, Some(TransactionCategory::Customer));
        assert_eq!(order.card.number.expose(), "4111111111111111");
    }

    #[test]
    fn test_blank_category_is_unspecified() {
        let record = read("1234567, 10.00, 1, order-2, 4111111111111111, 123, 05, 2030, JOHN DOE, ");
        let order = PaymentOrder::try_from(record).unwrap();
        assert_eq!(order.category, None);
    }

    #[test]
    fn test_unknown_category() {
        let record = read("1234567, 10.00, 2, order-3, 4111111111111111, 123, 05, 2030, JOHN DOE, bogus");
        assert!(matches!(
            PaymentOrder::try_from(record),
            Err(PaymentError::UnknownCategory(s)) if s == "bogus"
        ));
    }
}
