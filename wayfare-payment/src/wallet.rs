//! QR wallet gateway. Payment creation is an outbound POST signed with
//! HMAC-SHA256; callbacks come back signed the same way.

use crate::signature::{sign_sha256, sorted_pairs, verify_sha256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wayfare_core::payment::{
    CallbackVerdict, GatewayError, GatewayKind, PaymentGateway, PaymentInitiation, PaymentRequest,
    WalletTransport,
};

const REQUEST_TYPE: &str = "captureWallet";

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: String,
    /// Create-payment endpoint on the gateway side.
    pub endpoint: String,
    /// Where the gateway sends the customer after paying.
    pub redirect_url: String,
    /// Server-to-server notify hook.
    pub ipn_url: String,
}

pub struct WalletGateway {
    config: WalletConfig,
    transport: Arc<dyn WalletTransport>,
}

impl WalletGateway {
    pub fn new(config: WalletConfig, transport: Arc<dyn WalletTransport>) -> Self {
        Self { config, transport }
    }

    /// Fixed-order signature base for the create-payment request. The
    /// gateway rejects any other field order, so this is not the sorted
    /// shape callbacks use.
    fn create_signature_base(&self, request_id: &str, request: &PaymentRequest) -> String {
        format!(
            "accessKey={}&amount={}&extraData=&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
            self.config.access_key,
            wire_amount(request.amount),
            self.config.ipn_url,
            request.order_ref,
            request.order_info,
            self.config.partner_code,
            self.config.redirect_url,
            request_id,
            REQUEST_TYPE,
        )
    }

    /// Callback signature base: every received parameter except the
    /// signature itself, plus our access key, sorted.
    fn callback_signature_base(&self, params: &HashMap<String, String>) -> String {
        let mut signed: HashMap<String, String> = params.clone();
        signed.insert("accessKey".to_string(), self.config.access_key.clone());
        sorted_pairs(&signed, "signature")
    }
}

#[async_trait]
impl PaymentGateway for WalletGateway {
    fn kind(&self) -> GatewayKind {
        GatewayKind::Wallet
    }

    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentInitiation, GatewayError> {
        let request_id = Uuid::new_v4().to_string();
        let signature = sign_sha256(
            &self.config.secret_key,
            &self.create_signature_base(&request_id, request),
        )?;

        let body = json!({
            "partnerCode": self.config.partner_code,
            "requestId": request_id,
            "amount": wire_amount(request.amount),
            "orderId": request.order_ref,
            "orderInfo": request.order_info,
            "redirectUrl": self.config.redirect_url,
            "ipnUrl": self.config.ipn_url,
            "extraData": "",
            "requestType": REQUEST_TYPE,
            "signature": signature,
        });

        let response = self
            .transport
            .post_create(&self.config.endpoint, body)
            .await?;

        let result_code = response["resultCode"].as_i64().ok_or_else(|| {
            GatewayError::Rejected("gateway response carried no resultCode".to_string())
        })?;
        if result_code != 0 {
            let message = response["message"].as_str().unwrap_or("create rejected");
            return Err(GatewayError::Rejected(format!(
                "{} (code {})",
                message, result_code
            )));
        }

        let pay_url = response["payUrl"]
            .as_str()
            .ok_or_else(|| GatewayError::Rejected("gateway response missing payUrl".to_string()))?
            .to_string();
        let qr_payload = response["qrCodeUrl"].as_str().map(str::to_string);

        Ok(PaymentInitiation {
            gateway: GatewayKind::Wallet,
            order_ref: request.order_ref.clone(),
            pay_url,
            qr_payload,
        })
    }

    fn parse_callback(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<CallbackVerdict, GatewayError> {
        let order_ref = params
            .get("orderId")
            .ok_or_else(|| GatewayError::MalformedCallback("missing orderId".to_string()))?
            .clone();
        let raw_amount = params
            .get("amount")
            .ok_or_else(|| GatewayError::MalformedCallback("missing amount".to_string()))?;
        let amount = Decimal::from_str(raw_amount).map_err(|_| {
            GatewayError::MalformedCallback(format!("unparseable amount {:?}", raw_amount))
        })?;
        let code = params
            .get("resultCode")
            .ok_or_else(|| GatewayError::MalformedCallback("missing resultCode".to_string()))?
            .clone();

        let signature_valid = match params.get("signature") {
            Some(signature) => verify_sha256(
                &self.config.secret_key,
                &self.callback_signature_base(params),
                signature,
            ),
            None => false,
        };

        let success = code == "0";
        let message = if success {
            "payment successful".to_string()
        } else {
            wallet_failure_message(&code)
        };

        Ok(CallbackVerdict {
            order_ref,
            amount,
            success,
            signature_valid,
            code,
            message,
        })
    }
}

/// Human-readable text for the wallet gateway's failure codes.
fn wallet_failure_message(code: &str) -> String {
    match code {
        "1005" => "payment link expired".to_string(),
        "1006" => "payment declined by the payer".to_string(),
        "9000" => "payment authorized but not yet captured".to_string(),
        other => format!("payment failed (code {})", other),
    }
}

/// Wallet amounts travel in major units; trailing zeros are stripped so
/// both sides sign identical bytes.
fn wire_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Production transport: a plain HTTP POST with a bounded timeout.
pub struct HttpWalletTransport {
    client: reqwest::Client,
}

impl HttpWalletTransport {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WalletTransport for HttpWalletTransport {
    async fn post_create(&self, endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))
    }
}

/// Offline transport that accepts every create request. The pay and QR
/// urls it fabricates embed the order reference so flows stay traceable
/// without a live gateway.
pub struct SandboxTransport;

#[async_trait]
impl WalletTransport for SandboxTransport {
    async fn post_create(&self, _endpoint: &str, body: Value) -> Result<Value, GatewayError> {
        let order_id = body["orderId"].as_str().unwrap_or("unknown");
        Ok(json!({
            "resultCode": 0,
            "message": "ok",
            "payUrl": format!("https://sandbox.wallet.test/pay/{}", order_id),
            "qrCodeUrl": format!("https://sandbox.wallet.test/qr/{}", order_id),
        }))
    }
}
