use super::category::TransactionCategory;
use crate::error::PaymentError;

pub const MAX_INSTALLMENTS: u32 = 12;

/// A validated installment count in `1..=12`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Installments(u8);

impl Installments {
    /// Checks the count range and its pairing with the requested category.
    ///
    /// A single payment is a cash sale, so it only accepts `Cash` or no
    /// category at all. Plans of two or more installments must not be `Cash`.
    pub fn validate(
        count: u32,
        category: Option<TransactionCategory>,
    ) -> Result<Self, PaymentError> {
        if !(1..=MAX_INSTALLMENTS).contains(&count) {
            return Err(PaymentError::InvalidArgument(format!(
                "installments must be an integer between 1 and {MAX_INSTALLMENTS}, got {count}"
            )));
        }

        match (count, category) {
            (1, None | Some(TransactionCategory::Cash)) => {}
            (1, Some(other)) => {
                return Err(PaymentError::InvalidArgument(format!(
                    "a single installment requires the \"cash\" category or none, got {other:?}"
                )));
            }
            (_, Some(TransactionCategory::Cash)) => {
                return Err(PaymentError::InvalidArgument(format!(
                    "{count} installments cannot use the \"cash\" category"
                )));
            }
            _ => {}
        }

        // Range checked above.
        Ok(Self(count as u8))
    }

    pub fn is_single(self) -> bool {
        self.0 == 1
    }

    /// Two-character wire code: `"00"` for a single payment, else zero-padded.
    pub fn code(self) -> String {
        if self.is_single() {
            "00".to_string()
        } else {
            format!("{:02}", self.0)
        }
    }

    /// Category actually sent to the gateway for this plan.
    pub fn category_for(self, requested: Option<TransactionCategory>) -> TransactionCategory {
        if self.is_single() {
            TransactionCategory::Cash
        } else {
            TransactionCategory::resolve(requested)
        }
    }
}
