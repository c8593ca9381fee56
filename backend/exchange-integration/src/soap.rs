//! Wire construction and parsing for the exchange's SOAP 1.2 surface.
//!
//! Envelopes are assembled by string formatting with every interpolated value
//! XML-escaped first; responses are parsed with `quick-xml`. The response
//! parser accepts only envelopes whose root carries one of the configured
//! namespace prefixes and fails loudly on anything else, so a vendor-side
//! prefix change surfaces as a parse error instead of a silent empty token.

use domain_types::{CustomResult, ExchangeError};
use error_stack::report;
use quick_xml::{events::Event, Reader};

/// SOAP action URIs, one per exchange web method.
pub mod actions {
    pub const ORDER_ENTRY: &str = "http://bsestarmf.in/MFOrderEntry/orderEntryParam";
    pub const SIP_ORDER_ENTRY: &str = "http://bsestarmf.in/MFOrderEntry/sipOrderEntryParam";
    pub const XSIP_ORDER_ENTRY: &str = "http://bsestarmf.in/MFOrderEntry/xsipOrderEntryParam";
    pub const SWITCH_ORDER_ENTRY: &str = "http://bsestarmf.in/MFOrderEntry/switchOrderEntryParam";
    pub const SPREAD_ORDER_ENTRY: &str = "http://bsestarmf.in/MFOrderEntry/spreadOrderEntryParam";
    pub const MFAPI: &str = "http://bsestarmf.in/MFUploadService/MFAPI";
}

/// A fully built envelope plus the SOAP action the transport must send with
/// it. The action travels in the `SOAPAction` HTTP header, not the XML.
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    pub action: String,
    pub xml: String,
}

/// Escapes the five XML metacharacters. `&` first, or the later passes would
/// double-escape their own output.
pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Wraps an inner body in a SOAP 1.2 envelope with an empty header. The body
/// arrives pre-escaped; nothing is escaped here.
pub fn envelope(action: &str, body: &str) -> SoapEnvelope {
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:ns="http://bsestarmf.in/"><soap:Header/><soap:Body>{body}</soap:Body></soap:Envelope>"#
    );
    SoapEnvelope {
        action: action.to_string(),
        xml,
    }
}

/// Login body. The password and pass-key land here in plaintext; the caller
/// sanitizes before anything is logged or audited.
pub fn password_request_body(
    exchange_user_id: &str,
    member_id: &str,
    password: &str,
    pass_key: &str,
) -> String {
    format!(
        "<ns:getPassword><ns:UserId>{}</ns:UserId><ns:MemberId>{}</ns:MemberId><ns:Password>{}</ns:Password><ns:PassKey>{}</ns:PassKey></ns:getPassword>",
        escape_xml(exchange_user_id),
        escape_xml(member_id),
        escape_xml(password),
        escape_xml(pass_key),
    )
}

fn order_body(element: &str, trans_code: &str, pipe_params: &str) -> String {
    format!(
        "<ns:{element}><ns:TransCode>{}</ns:TransCode><ns:Param>{}</ns:Param></ns:{element}>",
        escape_xml(trans_code),
        escape_xml(pipe_params),
    )
}

/// Lump-sum purchase, redemption and cancellation share one web method; the
/// transaction code inside the params selects the operation.
pub fn order_entry_body(trans_code: &str, pipe_params: &str) -> String {
    order_body("orderEntryParam", trans_code, pipe_params)
}

pub fn sip_order_entry_body(trans_code: &str, pipe_params: &str) -> String {
    order_body("sipOrderEntryParam", trans_code, pipe_params)
}

pub fn xsip_order_entry_body(trans_code: &str, pipe_params: &str) -> String {
    order_body("xsipOrderEntryParam", trans_code, pipe_params)
}

pub fn switch_order_entry_body(trans_code: &str, pipe_params: &str) -> String {
    order_body("switchOrderEntryParam", trans_code, pipe_params)
}

pub fn spread_order_entry_body(trans_code: &str, pipe_params: &str) -> String {
    order_body("spreadOrderEntryParam", trans_code, pipe_params)
}

/// Flags for the upload service's multiplexed `MFAPI` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ServiceFlag {
    FatcaUpload,
    UccRegistration,
    CkycUpload,
    MandateRegistration,
    OrderStatus,
}

impl ServiceFlag {
    pub fn code(self) -> &'static str {
        match self {
            Self::FatcaUpload => "01",
            Self::UccRegistration => "02",
            Self::CkycUpload => "05",
            Self::MandateRegistration => "06",
            Self::OrderStatus => "07",
        }
    }
}

/// Body for the additional-services surface. The session token rides in the
/// `EncryptedPassword` element, a vendor naming quirk; it is the short-lived
/// token, not the account password.
pub fn additional_services_body(
    flag: ServiceFlag,
    exchange_user_id: &str,
    token: &str,
    pipe_params: &str,
) -> String {
    format!(
        "<ns:MFAPI><ns:Flag>{}</ns:Flag><ns:UserId>{}</ns:UserId><ns:EncryptedPassword>{}</ns:EncryptedPassword><ns:param>{}</ns:param></ns:MFAPI>",
        flag.code(),
        escape_xml(exchange_user_id),
        escape_xml(token),
        escape_xml(pipe_params),
    )
}

/// Joins optional fields into the exchange's positional pipe format. `None`
/// becomes an empty segment and trailing empties are preserved, because the
/// vendor parses by position.
pub fn join_pipe_params(fields: &[Option<String>]) -> String {
    fields
        .iter()
        .map(|field| field.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("|")
}

/// Pulls the text of the named result element out of a response envelope.
///
/// The root element must be `Envelope` under one of `allowed_prefixes`;
/// anything else is a fatal parse failure, never an empty string.
pub fn extract_soap_result(
    xml: &str,
    result_tag: &str,
    allowed_prefixes: &[String],
) -> CustomResult<String, ExchangeError> {
    let mut reader = Reader::from_str(xml);
    let mut root_checked = false;
    let mut in_result = false;
    let mut result_text = String::new();

    loop {
        let event = reader.read_event().map_err(|err| {
            report!(ExchangeError::ResponseParseFailed(format!(
                "invalid xml in exchange response: {err}"
            )))
        })?;
        match event {
            Event::Start(start) => {
                if !root_checked {
                    root_checked = true;
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    let recognized = allowed_prefixes
                        .iter()
                        .any(|prefix| name == format!("{prefix}:Envelope"));
                    if !recognized {
                        return Err(report!(ExchangeError::ResponseParseFailed(format!(
                            "unrecognized envelope root <{name}>, expected one of: {}",
                            allowed_prefixes
                                .iter()
                                .map(|p| format!("{p}:Envelope"))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))));
                    }
                } else if start.local_name().as_ref() == result_tag.as_bytes() {
                    in_result = true;
                }
            }
            Event::Text(text) if in_result => {
                let fragment = text.unescape().map_err(|err| {
                    report!(ExchangeError::ResponseParseFailed(format!(
                        "unescapable result text: {err}"
                    )))
                })?;
                result_text.push_str(&fragment);
            }
            Event::End(end) if in_result => {
                if end.local_name().as_ref() == result_tag.as_bytes() {
                    return Ok(result_text);
                }
            }
            Event::Eof => {
                return Err(report!(ExchangeError::ResponseParseFailed(format!(
                    "result element <{result_tag}> not found in exchange response"
                ))));
            }
            _ => {}
        }
    }
}
