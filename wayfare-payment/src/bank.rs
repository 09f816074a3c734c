//! Card/banking gateway. Payment creation is pure URL construction; the
//! customer is redirected to the bank and comes back with a signed query.

use crate::signature::{sign_sha512, sorted_encoded_pairs, verify_sha512};
use async_trait::async_trait;
use std::collections::HashMap;
use wayfare_core::payment::{
    CallbackVerdict, GatewayError, GatewayKind, PaymentGateway, PaymentInitiation, PaymentRequest,
};
use wayfare_shared::money::{from_minor_units, to_minor_units};

#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Merchant terminal code issued by the gateway.
    pub tmn_code: String,
    pub secret_key: String,
    /// The bank's hosted payment page.
    pub pay_url: String,
    /// Where the bank sends the customer back.
    pub return_url: String,
}

pub struct BankGateway {
    config: BankConfig,
}

impl BankGateway {
    pub fn new(config: BankConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PaymentGateway for BankGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Bank
    }

    /// No outbound call here: the signed query string is the whole
    /// handshake. Amounts are scaled x100 into minor units on the wire.
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        let mut params = HashMap::new();
        params.insert("tmnCode".to_string(), self.config.tmn_code.clone());
        params.insert(
            "amount".to_string(),
            to_minor_units(request.amount).to_string(),
        );
        params.insert("txnRef".to_string(), request.order_ref.clone());
        params.insert("orderInfo".to_string(), request.order_info.clone());
        params.insert("returnUrl".to_string(), self.config.return_url.clone());

        let query = sorted_encoded_pairs(&params, "secureHash");
        let secure_hash = sign_sha512(&self.config.secret_key, &query)?;
        let pay_url = format!("{}?{}&secureHash={}", self.config.pay_url, query, secure_hash);

        Ok(PaymentInitiation {
            gateway: GatewayKind::Bank,
            order_ref: request.order_ref.clone(),
            pay_url,
            qr_payload: None,
        })
    }

    fn parse_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<CallbackVerdict, GatewayError> {
        let order_ref = params
            .get("txnRef")
            .ok_or_else(|| GatewayError::MalformedCallback("missing txnRef".to_string()))?
            .clone();
        let raw_amount = params
            .get("amount")
            .ok_or_else(|| GatewayError::MalformedCallback("missing amount".to_string()))?;
        let minor: i64 = raw_amount.parse().map_err(|_| {
            GatewayError::MalformedCallback(format!("unparseable amount {:?}", raw_amount))
        })?;
        let code = params
            .get("responseCode")
            .ok_or_else(|| GatewayError::MalformedCallback("missing responseCode".to_string()))?
            .clone();

        let signature_valid = match params.get("secureHash") {
            Some(signature) => verify_sha512(
                &self.config.secret_key,
                &sorted_encoded_pairs(params, "secureHash"),
                signature,
            ),
            None => false,
        };

        let success = code == "00";
        let message = if success {
            "payment successful".to_string()
        } else {
            bank_failure_message(&code)
        };

        Ok(CallbackVerdict {
            order_ref,
            amount: from_minor_units(minor),
            success,
            signature_valid,
            code,
            message,
        })
    }
}

/// Human-readable text for the bank gateway's response codes.
fn bank_failure_message(code: &str) -> String {
    match code {
        "24" => "payment cancelled by the customer".to_string(),
        "51" => "insufficient funds".to_string(),
        "65" => "daily transaction limit exceeded".to_string(),
        other => format!("payment failed (code {})", other),
    }
}
