use std::fmt;

const MASK: &str = "************";

/// A full primary account number. `Debug` never prints the digits.
#[derive(Clone, PartialEq, Eq)]
pub struct CardNumber(String);

impl CardNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// The digits as they must be sent to the gateway.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// One-way conversion keeping only the last four characters.
    pub fn mask(&self) -> MaskedCardNumber {
        let chars: Vec<char> = self.0.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        MaskedCardNumber(format!("{MASK}{tail}"))
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber({})", self.mask())
    }
}

/// `"************"` followed by the last four digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedCardNumber(String);

impl MaskedCardNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaskedCardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Card data supplied by the payer, sent once with the authorization.
#[derive(Clone)]
pub struct CardDetails {
    pub number: CardNumber,
    pub cvc2: String,
    pub exp_month: String,
    pub exp_year: String,
    pub holder_name: String,
}

impl CardDetails {
    /// Drops the full number and the CVC2, keeping what a receipt may show.
    pub fn redact(&self) -> RedactedCard {
        RedactedCard {
            number: self.number.mask(),
            exp_month: self.exp_month.clone(),
            exp_year: self.exp_year.clone(),
            holder_name: self.holder_name.clone(),
        }
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.number)
            .field("cvc2", &"***")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("holder_name", &self.holder_name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedCard {
    pub number: MaskedCardNumber,
    pub exp_month: String,
    pub exp_year: String,
    pub holder_name: String,
}

/// Card data held by a payment attempt.
///
/// Moves from `Full` to `Redacted` once the gateway has answered the
/// authorization request, and never back.
#[derive(Debug, Clone)]
pub enum CardData {
    Full(CardDetails),
    Redacted(RedactedCard),
}

impl CardData {
    pub fn redact(&mut self) {
        if let CardData::Full(details) = self {
            let redacted = details.redact();
            *self = CardData::Redacted(redacted);
        }
    }

    pub fn full(&self) -> Option<&CardDetails> {
        match self {
            CardData::Full(details) => Some(details),
            CardData::Redacted(_) => None,
        }
    }

    pub fn redacted(&self) -> Option<&RedactedCard> {
        match self {
            CardData::Full(_) => None,
            CardData::Redacted(card) => Some(card),
        }
    }

    /// Masked number, available in either state.
    pub fn masked_number(&self) -> MaskedCardNumber {
        match self {
            CardData::Full(details) => details.number.mask(),
            CardData::Redacted(card) => card.number.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> CardDetails {
        CardDetails {
            number: CardNumber::new("4111111111111111"),
            cvc2: "123".to_string(),
            exp_month: "05".to_string(),
            exp_year: "2030".to_string(),
            holder_name: "JOHN DOE".to_string(),
        }
    }

    #[test]
    fn test_mask_keeps_last_four() {
        let masked = CardNumber::new("5500000000000004").mask();
        assert_eq!(masked.as_str(), "************0004");
    }

    #[test]
    fn test_mask_short_number() {
        assert_eq!(CardNumber::new("12").mask().as_str(), "************12");
    }

    #[test]
    fn test_debug_hides_sensitive_fields() {
        let rendered = format!("{:?}", details());
        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("123\""));
        assert!(rendered.contains("************1111"));
    }

    #[test]
    fn test_redaction_is_one_way() {
        let mut card = CardData::Full(details());
        card.redact();
        assert!(card.full().is_none());
        let redacted = card.redacted().unwrap();
        assert_eq!(redacted.number.as_str(), "************1111");
        assert_eq!(redacted.holder_name, "JOHN DOE");

        // A second redaction leaves the masked value alone.
        card.redact();
        assert_eq!(card.masked_number().as_str(), "************1111");
    }
}
