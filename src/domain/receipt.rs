use super::gateway::AuthorizationTokens;

/// Transaction type marker the receipt page expects in `TRANSACAO`.
pub const RECEIPT_TRANSACTION_TYPE: &str = "201";

/// Form fields posted to the receipt page, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRequest {
    fields: Vec<(&'static str, String)>,
}

impl ReceiptRequest {
    pub fn new(tokens: &AuthorizationTokens, affiliation_id: &str) -> Self {
        Self {
            fields: vec![
                ("DATA", tokens.date.clone()),
                ("TRANSACAO", RECEIPT_TRANSACTION_TYPE.to_string()),
                ("NUMAUTOR", tokens.authorization_number.clone()),
                ("NUMCV", tokens.voucher_number.clone()),
                ("FILIACAO", affiliation_id.to_string()),
            ],
        }
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_fields_in_order() {
        let tokens = AuthorizationTokens {
            date: "20240115".to_string(),
            authorization_number: "123456".to_string(),
            voucher_number: "987654".to_string(),
            ..Default::default()
        };
        let request = ReceiptRequest::new(&tokens, "1234567");

        let keys: Vec<&str> = request.fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["DATA", "TRANSACAO", "NUMAUTOR", "NUMCV", "FILIACAO"]);
        assert_eq!(request.get("TRANSACAO"), Some("201"));
        assert_eq!(request.get("NUMCV"), Some("987654"));
        assert_eq!(request.get("FILIACAO"), Some("1234567"));
        assert_eq!(request.get("MISSING"), None);
    }
}
