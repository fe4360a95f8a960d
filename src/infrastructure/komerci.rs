//! Komerci SOAP transport and receipt page client.
//!
//! Requests are serialized with quick-xml and wrapped in a SOAP 1.1 envelope.
//! Responses have their element prefixes removed before being deserialized
//! into the nested result structures.

use crate::config::GatewayConfig;
use crate::domain::gateway::{
    AuthorizationRequest, AuthorizationResponse, AuthorizationTokens, ConfirmationRequest,
    ConfirmationResponse,
};
use crate::domain::ports::{Connector, GatewayClient, ReceiptFetcher, Transport};
use crate::domain::receipt::ReceiptRequest;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const SERVICE_NAMESPACE: &str = "http://ecommerce.redecard.com.br";

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const BODY_SNIPPET_LEN: usize = 512;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename = "GetAuthorized")]
struct GetAuthorizedXml<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "TOTAL")]
    total: &'a str,
    #[serde(rename = "TRANSACAO")]
    category: &'a str,
    #[serde(rename = "PARCELAS")]
    installments: &'a str,
    #[serde(rename = "FILIACAO")]
    affiliation_id: &'a str,
    #[serde(rename = "NUMPEDIDO")]
    order_id: &'a str,
    #[serde(rename = "NRCARTAO")]
    card_number: &'a str,
    #[serde(rename = "CVC2")]
    cvc2: &'a str,
    #[serde(rename = "MES")]
    exp_month: &'a str,
    #[serde(rename = "ANO")]
    exp_year: &'a str,
    #[serde(rename = "PORTADOR")]
    card_holder_name: &'a str,
    #[serde(rename = "IATA", skip_serializing_if = "Option::is_none")]
    iata: Option<&'a str>,
    #[serde(rename = "DISTRIBUIDOR", skip_serializing_if = "Option::is_none")]
    distributor: Option<&'a str>,
    #[serde(rename = "CONCENTRADOR", skip_serializing_if = "Option::is_none")]
    concentrator: Option<&'a str>,
    #[serde(rename = "TAXAEMBARQUE", skip_serializing_if = "Option::is_none")]
    boarding_tax: Option<&'a str>,
    #[serde(rename = "ENTRADA", skip_serializing_if = "Option::is_none")]
    entry: Option<&'a str>,
    #[serde(rename = "NUMDOC1", skip_serializing_if = "Option::is_none")]
    document1: Option<&'a str>,
    #[serde(rename = "NUMDOC2", skip_serializing_if = "Option::is_none")]
    document2: Option<&'a str>,
    #[serde(rename = "NUMDOC3", skip_serializing_if = "Option::is_none")]
    document3: Option<&'a str>,
    #[serde(rename = "NUMDOC4", skip_serializing_if = "Option::is_none")]
    document4: Option<&'a str>,
    #[serde(rename = "PAX1", skip_serializing_if = "Option::is_none")]
    passenger1: Option<&'a str>,
    #[serde(rename = "PAX2", skip_serializing_if = "Option::is_none")]
    passenger2: Option<&'a str>,
    #[serde(rename = "PAX3", skip_serializing_if = "Option::is_none")]
    passenger3: Option<&'a str>,
    #[serde(rename = "PAX4", skip_serializing_if = "Option::is_none")]
    passenger4: Option<&'a str>,
    #[serde(rename = "CONFTXN")]
    auto_confirm: &'a str,
}

impl<'a> From<&'a AuthorizationRequest> for GetAuthorizedXml<'a> {
    fn from(request: &'a AuthorizationRequest) -> Self {
        let extras = &request.extras;
        Self {
            xmlns: SERVICE_NAMESPACE,
            total: &request.total,
            category: request.category_code,
            installments: &request.installments_code,
            affiliation_id: &request.affiliation_id,
            order_id: &request.order_id,
            card_number: &request.card_number,
            cvc2: &request.cvc2,
            exp_month: &request.exp_month,
            exp_year: &request.exp_year,
            card_holder_name: &request.card_holder_name,
            iata: extras.iata.as_deref(),
            distributor: extras.distributor.as_deref(),
            concentrator: extras.concentrator.as_deref(),
            boarding_tax: extras.boarding_tax.as_deref(),
            entry: extras.entry.as_deref(),
            document1: extras.documents[0].as_deref(),
            document2: extras.documents[1].as_deref(),
            document3: extras.documents[2].as_deref(),
            document4: extras.documents[3].as_deref(),
            passenger1: extras.passengers[0].as_deref(),
            passenger2: extras.passengers[1].as_deref(),
            passenger3: extras.passengers[2].as_deref(),
            passenger4: extras.passengers[3].as_deref(),
            auto_confirm: request.auto_confirm,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "ConfirmTxn")]
struct ConfirmTxnXml<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "DATA")]
    date: &'a str,
    #[serde(rename = "NUMSQN")]
    sequence_number: &'a str,
    #[serde(rename = "NUMCV")]
    voucher_number: &'a str,
    #[serde(rename = "NUMAUTOR")]
    authorization_number: &'a str,
    #[serde(rename = "PARCELAS")]
    installments: &'a str,
    #[serde(rename = "TRANSORIG")]
    category: &'a str,
    #[serde(rename = "TOTAL")]
    total: &'a str,
    #[serde(rename = "FILIACAO")]
    affiliation_id: &'a str,
    #[serde(rename = "DISTRIBUIDOR")]
    distributor: &'a str,
    #[serde(rename = "NUMPEDIDO")]
    order_id: &'a str,
    // Wire contract: the order id goes out a second time as NUMDOC1.
    #[serde(rename = "NUMDOC1")]
    first_document: &'a str,
    #[serde(rename = "NUMDOC2", skip_serializing_if = "Option::is_none")]
    document2: Option<&'a str>,
    #[serde(rename = "NUMDOC3", skip_serializing_if = "Option::is_none")]
    document3: Option<&'a str>,
    #[serde(rename = "NUMDOC4", skip_serializing_if = "Option::is_none")]
    document4: Option<&'a str>,
    #[serde(rename = "PAX1", skip_serializing_if = "Option::is_none")]
    passenger1: Option<&'a str>,
    #[serde(rename = "PAX2", skip_serializing_if = "Option::is_none")]
    passenger2: Option<&'a str>,
    #[serde(rename = "PAX3", skip_serializing_if = "Option::is_none")]
    passenger3: Option<&'a str>,
    #[serde(rename = "PAX4", skip_serializing_if = "Option::is_none")]
    passenger4: Option<&'a str>,
}

impl<'a> From<&'a ConfirmationRequest> for ConfirmTxnXml<'a> {
    fn from(request: &'a ConfirmationRequest) -> Self {
        let extras = &request.extras;
        Self {
            xmlns: SERVICE_NAMESPACE,
            date: &request.date,
            sequence_number: &request.sequence_number,
            voucher_number: &request.voucher_number,
            authorization_number: &request.authorization_number,
            installments: &request.installments_code,
            category: request.category_code,
            total: &request.total,
            affiliation_id: &request.affiliation_id,
            distributor: &request.distributor,
            order_id: &request.order_id,
            first_document: &request.first_document,
            document2: extras.documents[0].as_deref(),
            document3: extras.documents[1].as_deref(),
            document4: extras.documents[2].as_deref(),
            passenger1: extras.passengers[0].as_deref(),
            passenger2: extras.passengers[1].as_deref(),
            passenger3: extras.passengers[2].as_deref(),
            passenger4: extras.passengers[3].as_deref(),
        }
    }
}

fn envelope<T: Serialize>(body: &T) -> Result<String> {
    let body = quick_xml::se::to_string(body).map_err(PaymentError::transport)?;
    Ok(format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="{SOAP_ENVELOPE_NS}"><soap:Body>{body}</soap:Body></soap:Envelope>"#
    ))
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<B> {
    #[serde(rename = "Body")]
    body: B,
}

#[derive(Debug, Deserialize)]
struct GetAuthorizedBody {
    #[serde(rename = "GetAuthorizedResponse")]
    response: GetAuthorizedResponse,
}

#[derive(Debug, Deserialize)]
struct GetAuthorizedResponse {
    #[serde(rename = "GetAuthorizedResult")]
    result: GetAuthorizedResult,
}

#[derive(Debug, Deserialize)]
struct GetAuthorizedResult {
    #[serde(rename = "AUTHORIZATION")]
    authorization: AuthorizationXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuthorizationXml {
    #[serde(rename = "CODRET")]
    code: Option<String>,
    #[serde(rename = "MSGRET")]
    message: Option<String>,
    #[serde(rename = "NUMPEDIDO")]
    order_number: Option<String>,
    #[serde(rename = "DATA")]
    date: Option<String>,
    #[serde(rename = "NUMAUTOR")]
    authorization_number: Option<String>,
    #[serde(rename = "NUMCV")]
    voucher_number: Option<String>,
    #[serde(rename = "NUMAUTENT")]
    authentication_number: Option<String>,
    #[serde(rename = "NUMSQN")]
    sequence_number: Option<String>,
    #[serde(rename = "ORIGEM_BIN")]
    bin_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfirmTxnBody {
    #[serde(rename = "ConfirmTxnResponse")]
    response: ConfirmTxnResponse,
}

#[derive(Debug, Deserialize)]
struct ConfirmTxnResponse {
    #[serde(rename = "ConfirmTxnResult")]
    result: ConfirmTxnResult,
}

#[derive(Debug, Deserialize)]
struct ConfirmTxnResult {
    #[serde(rename = "CONFIRMATION")]
    confirmation: ConfirmationXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfirmationXml {
    #[serde(rename = "CODRET")]
    code: Option<String>,
    #[serde(rename = "MSGRET")]
    message: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_code(value: Option<String>) -> Result<Option<i32>> {
    non_empty(value)
        .map(|code| {
            code.parse::<i32>()
                .map_err(|e| PaymentError::transport(format!("non-numeric CODRET {code:?}: {e}")))
        })
        .transpose()
}

impl TryFrom<AuthorizationXml> for AuthorizationResponse {
    type Error = PaymentError;

    fn try_from(xml: AuthorizationXml) -> Result<Self> {
        Ok(Self {
            code: parse_code(xml.code)?,
            message: non_empty(xml.message),
            tokens: AuthorizationTokens {
                order_number: non_empty(xml.order_number).unwrap_or_default(),
                date: non_empty(xml.date).unwrap_or_default(),
                authorization_number: non_empty(xml.authorization_number).unwrap_or_default(),
                voucher_number: non_empty(xml.voucher_number).unwrap_or_default(),
                authentication_number: non_empty(xml.authentication_number).unwrap_or_default(),
                sequence_number: non_empty(xml.sequence_number).unwrap_or_default(),
                bin_origin: non_empty(xml.bin_origin).unwrap_or_default(),
            },
        })
    }
}

impl TryFrom<ConfirmationXml> for ConfirmationResponse {
    type Error = PaymentError;

    fn try_from(xml: ConfirmationXml) -> Result<Self> {
        let code = parse_code(xml.code)?
            .ok_or_else(|| PaymentError::transport("ConfirmTxn response has no CODRET"))?;
        Ok(Self {
            code,
            message: non_empty(xml.message),
        })
    }
}

/// Rewrites every element name to its local part, whatever namespace prefix
/// the server chose (`soap:`, `SOAP-ENV:`, `s:`...), so element names match
/// the structures above. Attributes and text are copied untouched.
fn strip_element_prefixes(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        let event = match reader.read_event().map_err(PaymentError::transport)? {
            Event::Eof => break,
            Event::Start(start) => Event::Start(local_start(&start)?),
            Event::Empty(start) => Event::Empty(local_start(&start)?),
            Event::End(end) => Event::End(BytesEnd::new(local_name(end.local_name().as_ref())?)),
            other => other,
        };
        writer.write_event(event).map_err(PaymentError::transport)?;
    }

    String::from_utf8(writer.into_inner()).map_err(PaymentError::transport)
}

fn local_name(name: &[u8]) -> Result<String> {
    std::str::from_utf8(name)
        .map(str::to_string)
        .map_err(PaymentError::transport)
}

fn local_start(start: &BytesStart<'_>) -> Result<BytesStart<'static>> {
    let mut local = BytesStart::new(local_name(start.local_name().as_ref())?);
    for attribute in start.attributes() {
        local.push_attribute(attribute.map_err(PaymentError::transport)?);
    }
    Ok(local)
}

fn parse_envelope<B: DeserializeOwned>(xml: &str) -> Result<B> {
    let envelope: Envelope<B> = quick_xml::de::from_str(&strip_element_prefixes(xml)?)
        .map_err(PaymentError::transport)?;
    Ok(envelope.body)
}

// ============================================================================
// Clients
// ============================================================================

/// Speaks SOAP 1.1 to the Komerci `cap.asmx` service.
#[derive(Clone)]
pub struct SoapGatewayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SoapGatewayClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    async fn call(&self, action: &str, envelope: String) -> Result<String> {
        debug!(endpoint = %self.endpoint, action, "Calling gateway");
        let response = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{SERVICE_NAMESPACE}/{action}\""))
            .body(envelope)
            .send()
            .await
            .map_err(PaymentError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(PaymentError::transport)?;
        if !status.is_success() {
            let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
            return Err(PaymentError::transport(format!(
                "{action} failed with HTTP {status}: {snippet}"
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl GatewayClient for SoapGatewayClient {
    async fn get_authorized(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationResponse> {
        let envelope = envelope(&GetAuthorizedXml::from(request))?;
        let xml = self.call("GetAuthorized", envelope).await?;
        let body: GetAuthorizedBody = parse_envelope(&xml)?;
        body.response.result.authorization.try_into()
    }

    async fn confirm_txn(&self, request: &ConfirmationRequest) -> Result<ConfirmationResponse> {
        let envelope = envelope(&ConfirmTxnXml::from(request))?;
        let xml = self.call("ConfirmTxn", envelope).await?;
        let body: ConfirmTxnBody = parse_envelope(&xml)?;
        body.response.result.confirmation.try_into()
    }
}

/// Posts the receipt form and returns the rendered page untouched.
#[derive(Clone)]
pub struct HttpReceiptFetcher {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpReceiptFetcher {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReceiptFetcher for HttpReceiptFetcher {
    async fn fetch(&self, request: &ReceiptRequest) -> Result<Vec<u8>> {
        debug!(endpoint = %self.endpoint, "Fetching receipt");
        let response = self
            .http
            .post(&self.endpoint)
            .form(request.fields())
            .send()
            .await
            .map_err(PaymentError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::transport(format!(
                "receipt page failed with HTTP {status}"
            )));
        }
        let bytes = response.bytes().await.map_err(PaymentError::transport)?;
        Ok(bytes.to_vec())
    }
}

/// Builds a fresh HTTP client, bounded by the configured timeout, for every
/// payment attempt.
#[derive(Debug, Clone)]
pub struct KomerciConnector {
    config: GatewayConfig,
}

impl KomerciConnector {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

impl Connector for KomerciConnector {
    fn connect(&self) -> Result<Transport> {
        let http = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .build()
            .map_err(PaymentError::transport)?;

        Ok(Transport {
            gateway: Box::new(SoapGatewayClient::new(
                http.clone(),
                self.config.soap_url.clone(),
            )),
            receipts: Box::new(HttpReceiptFetcher::new(
                http,
                self.config.receipt_url.clone(),
            )),
        })
    }
}
