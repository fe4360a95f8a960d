//! Request and response shapes exchanged with the authorization gateway, and
//! the classification of its return codes.

/// `CONFTXN` value sent with every authorization: the gateway must wait for
/// an explicit `ConfirmTxn` instead of confirming on its own.
pub const DEFER_CONFIRMATION: &str = "N";

/// Optional identity and travel fields forwarded untouched with
/// `GetAuthorized`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationExtras {
    pub passengers: [Option<String>; 4],
    pub documents: [Option<String>; 4],
    pub iata: Option<String>,
    pub distributor: Option<String>,
    pub concentrator: Option<String>,
    pub boarding_tax: Option<String>,
    pub entry: Option<String>,
}

/// Optional fields forwarded untouched with `ConfirmTxn`.
///
/// Only documents 2 to 4 are caller-supplied: the first document slot of the
/// confirmation carries the order id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationExtras {
    pub passengers: [Option<String>; 4],
    pub documents: [Option<String>; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub total: String,
    pub category_code: &'static str,
    pub installments_code: String,
    pub affiliation_id: String,
    pub order_id: String,
    pub card_number: String,
    pub cvc2: String,
    pub exp_month: String,
    pub exp_year: String,
    pub card_holder_name: String,
    pub auto_confirm: &'static str,
    pub extras: AuthorizationExtras,
}

/// Opaque values issued by the gateway on authorization and echoed back on
/// confirmation and receipt retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationTokens {
    /// `NUMPEDIDO`
    pub order_number: String,
    /// `DATA`
    pub date: String,
    /// `NUMAUTOR`
    pub authorization_number: String,
    /// `NUMCV`
    pub voucher_number: String,
    /// `NUMAUTENT`
    pub authentication_number: String,
    /// `NUMSQN`
    pub sequence_number: String,
    /// `ORIGEM_BIN`
    pub bin_origin: String,
}

/// Raw `GetAuthorized` answer as the transport decoded it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationResponse {
    pub code: Option<i32>,
    /// Still URL-encoded, exactly as the gateway sent it.
    pub message: Option<String>,
    pub tokens: AuthorizationTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub date: String,
    pub sequence_number: String,
    pub voucher_number: String,
    pub authorization_number: String,
    pub installments_code: String,
    pub category_code: &'static str,
    pub total: String,
    pub affiliation_id: String,
    pub distributor: String,
    pub order_id: String,
    /// Sent as `NUMDOC1`. Always equal to `order_id`: the gateway contract
    /// expects the order id twice, do not merge it into `order_id`.
    pub first_document: String,
    pub extras: ConfirmationExtras,
}

/// Raw `ConfirmTxn` answer as the transport decoded it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationResponse {
    pub code: i32,
    pub message: Option<String>,
}

/// A successful authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub message: String,
    pub tokens: AuthorizationTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Approved(Authorization),
    Declined {
        code: i32,
        message: String,
        tokens: AuthorizationTokens,
    },
}

impl AuthorizationOutcome {
    /// A missing return code counts as approval; anything but zero declines.
    pub fn classify(response: AuthorizationResponse) -> Self {
        let code = response.code.unwrap_or(0);
        let message = decode_message(response.message.as_deref());
        match code {
            0 => Self::Approved(Authorization {
                message,
                tokens: response.tokens,
            }),
            code => Self::Declined {
                code,
                message,
                tokens: response.tokens,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Return code 0.
    Confirmed { message: String },
    /// Return code 1: confirmed, with a notice reported through the message.
    ConfirmedWithNotice { message: String },
    Declined { code: i32, message: String },
}

impl ConfirmationOutcome {
    pub fn classify(response: ConfirmationResponse) -> Self {
        let message = decode_message(response.message.as_deref());
        match response.code {
            0 => Self::Confirmed { message },
            1 => Self::ConfirmedWithNotice { message },
            code => Self::Declined { code, message },
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Declined { .. })
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Confirmed { .. } => 0,
            Self::ConfirmedWithNotice { .. } => 1,
            Self::Declined { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Confirmed { message }
            | Self::ConfirmedWithNotice { message }
            | Self::Declined { message, .. } => message,
        }
    }
}

/// Decodes a form-encoded gateway message (`+` is a space).
pub fn decode_message(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}
