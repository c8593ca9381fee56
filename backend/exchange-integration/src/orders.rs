//! Lump-sum order placement and cancellation over the order-entry surface.
//!
//! Both operations feed the same 26-position pipe layout; the transaction
//! code selects placement (`NEW`) or cancellation (`CXL`). Fields arrive
//! already formatted as strings, positions never reorder, and the session
//! token rides in the layout's `Password` slot.

use std::sync::Arc;

use common_utils::consts::DEFAULT_TIMEOUT;
use domain_types::{
    lift, parse_pipe_response, throw_if_error, CustomResult, ExchangeError, SessionType,
};
use error_stack::report;
use interfaces::{SoapCall, SoapTransport};

use crate::{
    credentials::CredentialService, mock::MockExchange, reference::ReferenceNumberGenerator,
    session::SessionManager, soap,
};

const ORDER_ENTRY_ENDPOINT: &str = "/MFOrderEntry/MFOrder.svc";
const ORDER_ENTRY_RESULT_TAG: &str = "orderEntryParamResult";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BuySell {
    Purchase,
    Redemption,
}

impl BuySell {
    fn code(self) -> &'static str {
        match self {
            Self::Purchase => "P",
            Self::Redemption => "R",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum BuySellType {
    Fresh,
    Additional,
}

/// One lump-sum order as received from the caller, amounts and units already
/// formatted the way the exchange expects them.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub client_code: String,
    pub scheme_code: String,
    pub buy_sell: BuySell,
    pub buy_sell_type: Option<BuySellType>,
    pub amount: Option<String>,
    pub units: Option<String>,
    /// Demat or physical settlement; the exchange defaults to physical.
    pub dp_txn_mode: Option<String>,
    pub folio_number: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancelRequest {
    pub reference_number: String,
    pub exchange_order_number: String,
    pub client_code: String,
    pub scheme_code: String,
    pub buy_sell: BuySell,
    pub buy_sell_type: Option<BuySellType>,
    /// Settlement mode of the order being cancelled; physical when absent.
    pub dp_txn_mode: Option<String>,
    pub amount: Option<String>,
    pub folio_number: Option<String>,
}

/// Outcome of an order-entry call, mock or real.
#[derive(Debug, Clone)]
pub struct OrderTicket {
    pub reference_number: String,
    pub exchange_order_number: Option<String>,
    pub response_code: String,
    pub message: String,
}

pub struct OrderService {
    sessions: Arc<SessionManager>,
    credentials: Arc<CredentialService>,
    references: Arc<ReferenceNumberGenerator>,
    transport: Arc<dyn SoapTransport>,
    envelope_prefixes: Vec<String>,
    mock: Option<MockExchange>,
}

impl OrderService {
    pub fn new(
        sessions: Arc<SessionManager>,
        credentials: Arc<CredentialService>,
        references: Arc<ReferenceNumberGenerator>,
        transport: Arc<dyn SoapTransport>,
        envelope_prefixes: Vec<String>,
        mock_mode: bool,
    ) -> Self {
        Self {
            sessions,
            credentials,
            references,
            transport,
            envelope_prefixes,
            mock: mock_mode.then(MockExchange::default),
        }
    }

    pub async fn place_purchase(
        &self,
        user_id: &str,
        mut request: OrderRequest,
    ) -> CustomResult<OrderTicket, ExchangeError> {
        if request.amount.is_none() {
            return Err(report!(ExchangeError::InvalidRequest(
                "amount is required for purchase orders".to_string()
            )));
        }
        request.buy_sell = BuySell::Purchase;
        if request.buy_sell_type.is_none() {
            request.buy_sell_type = Some(BuySellType::Fresh);
        }
        self.place(user_id, request).await
    }

    pub async fn place_redemption(
        &self,
        user_id: &str,
        mut request: OrderRequest,
    ) -> CustomResult<OrderTicket, ExchangeError> {
        if request.amount.is_none() && request.units.is_none() {
            return Err(report!(ExchangeError::InvalidRequest(
                "either amount or units is required for redemption".to_string()
            )));
        }
        request.buy_sell = BuySell::Redemption;
        self.place(user_id, request).await
    }

    pub async fn cancel_order(
        &self,
        user_id: &str,
        request: CancelRequest,
    ) -> CustomResult<OrderTicket, ExchangeError> {
        let profile = self.credentials.status(user_id).await?;
        if !profile.configured {
            return Err(report!(ExchangeError::CredentialsNotConfigured));
        }
        if !profile.active {
            return Err(report!(ExchangeError::CredentialsInactive));
        }
        let member_id = profile.member_id.unwrap_or_default();
        let euin = profile.euin;

        if let Some(mock) = &self.mock {
            return finish(
                request.reference_number.clone(),
                parse_pipe_response(&mock.order_entry_response("CXL")),
            );
        }

        let token = self
            .sessions
            .get_token(user_id, SessionType::OrderEntry)
            .await?;

        let fields: [Option<String>; 26] = [
            Some("CXL".to_string()),                       // TransCode
            Some(request.reference_number.clone()),        // UniqueRefNo
            Some(request.exchange_order_number),           // OrderId
            Some(member_id),                               // MemberId
            Some(request.client_code),                     // ClientCode
            Some(request.scheme_code),                     // SchemeCode
            Some(request.buy_sell.code().to_string()),     // BuySell
            request.buy_sell_type.map(|t| t.to_string()),  // BuySellType
            Some(request.dp_txn_mode.unwrap_or_else(|| "P".to_string())), // DPTxn
            request.amount,                                // OrderVal
            None,                                          // Qty
            None,                                          // AllRedeem
            request.folio_number,                          // FolioNo
            None,                                          // Remarks
            None,                                          // KYCStatus
            None,                                          // RefNo
            None,                                          // SubBrCode
            euin,                                          // EUIN
            Some("N".to_string()),                         // EUINVal
            None,                                          // MinRedeem
            None,                                          // DPC
            None,                                          // IPAdd
            Some(token),                                   // Password
            None,                                          // Param1
            None,                                          // Param2
            None,                                          // Param3
        ];

        let result = self
            .submit(user_id, "CXL", &fields, "OrderEntry_CXL")
            .await?;
        finish(request.reference_number, result)
    }

    async fn place(
        &self,
        user_id: &str,
        request: OrderRequest,
    ) -> CustomResult<OrderTicket, ExchangeError> {
        let profile = self.credentials.status(user_id).await?;
        if !profile.configured {
            return Err(report!(ExchangeError::CredentialsNotConfigured));
        }
        if !profile.active {
            return Err(report!(ExchangeError::CredentialsInactive));
        }
        let member_id = profile.member_id.unwrap_or_default();
        let euin = profile.euin;

        let reference_number = self.references.generate(&member_id).await?;

        if let Some(mock) = &self.mock {
            return finish(
                reference_number,
                parse_pipe_response(&mock.order_entry_response("NEW")),
            );
        }

        let token = self
            .sessions
            .get_token(user_id, SessionType::OrderEntry)
            .await?;
        let euin_declared = if euin.is_some() { "Y" } else { "N" };

        let fields: [Option<String>; 26] = [
            Some("NEW".to_string()),                       // TransCode
            Some(reference_number.clone()),                // UniqueRefNo
            None,                                          // OrderId (new order)
            Some(member_id),                               // MemberId
            Some(request.client_code),                     // ClientCode
            Some(request.scheme_code),                     // SchemeCode
            Some(request.buy_sell.code().to_string()),     // BuySell
            request.buy_sell_type.map(|t| t.to_string()),  // BuySellType
            Some(request.dp_txn_mode.unwrap_or_else(|| "P".to_string())), // DPTxn
            request.amount,                                // OrderVal
            request.units,                                 // Qty
            None,                                          // AllRedeem
            request.folio_number,                          // FolioNo
            request.remarks,                               // Remarks
            None,                                          // KYCStatus
            None,                                          // RefNo
            None,                                          // SubBrCode
            euin,                                          // EUIN
            Some(euin_declared.to_string()),               // EUINVal
            None,                                          // MinRedeem
            None,                                          // DPC
            None,                                          // IPAdd
            Some(token),                                   // Password
            None,                                          // Param1
            None,                                          // Param2
            None,                                          // Param3
        ];

        let api_name = format!("OrderEntry_NEW_{}", request.buy_sell.code());
        let result = self.submit(user_id, "NEW", &fields, &api_name).await?;
        finish(reference_number, result)
    }

    async fn submit(
        &self,
        user_id: &str,
        trans_code: &str,
        fields: &[Option<String>],
        api_name: &str,
    ) -> CustomResult<domain_types::ApiResult, ExchangeError> {
        let pipe_params = soap::join_pipe_params(fields);
        let body = soap::order_entry_body(trans_code, &pipe_params);
        let envelope = soap::envelope(soap::actions::ORDER_ENTRY, &body);

        let response = lift(
            self.transport
                .soap_request(SoapCall {
                    endpoint: ORDER_ENTRY_ENDPOINT,
                    soap_action: &envelope.action,
                    envelope: &envelope.xml,
                    owner_id: user_id,
                    api_name,
                    timeout: DEFAULT_TIMEOUT,
                })
                .await,
        )?;

        let raw = soap::extract_soap_result(
            &response.body,
            ORDER_ENTRY_RESULT_TAG,
            &self.envelope_prefixes,
        )?;
        Ok(parse_pipe_response(&raw))
    }
}

fn finish(
    reference_number: String,
    result: domain_types::ApiResult,
) -> CustomResult<OrderTicket, ExchangeError> {
    throw_if_error(&result)?;
    Ok(OrderTicket {
        reference_number,
        exchange_order_number: result.data.first().cloned(),
        response_code: result.code,
        message: result.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_sell_codes_match_the_wire_format() {
        assert_eq!(BuySell::Purchase.code(), "P");
        assert_eq!(BuySell::Redemption.code(), "R");
        assert_eq!(BuySellType::Fresh.to_string(), "FRESH");
        assert_eq!(BuySellType::Additional.to_string(), "ADDITIONAL");
    }
}
