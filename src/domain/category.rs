use crate::error::PaymentError;
use std::fmt;
use std::str::FromStr;

/// Transaction category understood by the gateway (`TRANSACAO` / `TRANSORIG`).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TransactionCategory {
    Cash,
    Customer,
    Shop,
    PreAuthorization,
}

/// Category used when the caller does not name one for an installment plan.
pub const DEFAULT_CATEGORY: TransactionCategory = TransactionCategory::Shop;

impl TransactionCategory {
    pub const ALL: [Self; 4] = [
        Self::Cash,
        Self::Customer,
        Self::Shop,
        Self::PreAuthorization,
    ];

    /// Numeric code sent on the wire.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cash => "04",
            Self::Customer => "06",
            Self::Shop => "08",
            Self::PreAuthorization => "73",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Customer => "customer",
            Self::Shop => "shop",
            Self::PreAuthorization => "pre-authorization",
        }
    }

    /// Resolves an optional category, falling back to [`DEFAULT_CATEGORY`].
    pub fn resolve(category: Option<Self>) -> Self {
        category.unwrap_or(DEFAULT_CATEGORY)
    }

    /// Parses an optional symbolic name such as `"pre-authorization"`.
    ///
    /// Blank input counts as unspecified and stays `None`: the installment
    /// rule treats a missing category differently from an explicit one.
    pub fn parse_optional(symbol: Option<&str>) -> Result<Option<Self>, PaymentError> {
        match symbol.map(str::trim) {
            None | Some("") => Ok(None),
            Some(symbol) => symbol.parse().map(Some),
        }
    }
}

impl FromStr for TransactionCategory {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.symbol() == s)
            .ok_or_else(|| PaymentError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_codes() {
        assert_eq!(TransactionCategory::Cash.code(), "04");
        assert_eq!(TransactionCategory::Customer.code(), "06");
        assert_eq!(TransactionCategory::Shop.code(), "08");
        assert_eq!(TransactionCategory::PreAuthorization.code(), "73");
    }

    #[test]
    fn test_parse_symbol() {
        let category = TransactionCategory::parse_optional(Some(" pre-authorization "))
            .unwrap()
            .unwrap();
        assert_eq!(category, TransactionCategory::PreAuthorization);
        assert_eq!(category.code(), "73");
    }

    #[test]
    fn test_blank_symbol_then_default_to_shop() {
        assert_eq!(TransactionCategory::parse_optional(None).unwrap(), None);
        let blank = TransactionCategory::parse_optional(Some("  ")).unwrap();
        assert_eq!(blank, None);
        assert_eq!(TransactionCategory::resolve(blank), TransactionCategory::Shop);
        assert_eq!(TransactionCategory::resolve(None).code(), "08");
    }

    #[test]
    fn test_unknown_symbol() {
        let result = TransactionCategory::parse_optional(Some("bogus"));
        assert!(matches!(result, Err(PaymentError::UnknownCategory(s)) if s == "bogus"));
    }

    #[test]
    fn test_symbol_round_trip() {
        for category in TransactionCategory::ALL {
            assert_eq!(category.symbol().parse::<TransactionCategory>().unwrap(), category);
        }
    }
}
