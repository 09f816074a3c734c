//! Booking-facing payment orchestration over the two gateway adapters.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_booking::{Booking, BookingRepository, BookingStatus};
use wayfare_core::payment::{
    GatewayError, GatewayKind, PaymentGateway, PaymentInitiation, PaymentRequest,
};
use wayfare_core::{CoreError, CoreResult};

/// What a processed callback means for the client-facing response.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub success: bool,
    pub booking_id: Option<Uuid>,
    pub message: String,
}

impl CallbackOutcome {
    fn failure(booking_id: Option<Uuid>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            booking_id,
            message: message.into(),
        }
    }

    fn paid(booking_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            success: true,
            booking_id: Some(booking_id),
            message: message.into(),
        }
    }
}

/// Compact payment state for polling clients.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub booking_id: Uuid,
    pub paid: bool,
    pub status: BookingStatus,
    pub price: Decimal,
}

/// Payment page data for one booking.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSheet {
    pub booking_id: Uuid,
    pub price: Decimal,
    pub paid: bool,
    pub status: BookingStatus,
    pub order_info: String,
}

pub struct PaymentService {
    bookings: Arc<dyn BookingRepository>,
    wallet: Arc<dyn PaymentGateway>,
    bank: Arc<dyn PaymentGateway>,
    /// When false (the sandbox default) a bad callback signature is logged
    /// and processing continues; when true it fails the callback outright.
    enforce_signatures: bool,
}

impl PaymentService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        wallet: Arc<dyn PaymentGateway>,
        bank: Arc<dyn PaymentGateway>,
        enforce_signatures: bool,
    ) -> Self {
        Self {
            bookings,
            wallet,
            bank,
            enforce_signatures,
        }
    }

    /// Start a payment attempt for a booking the caller owns. The charged
    /// amount is the booking's base price; extensions are settled with the
    /// operator separately.
    pub async fn initiate_payment(
        &self,
        booking_id: Uuid,
        user_id: &str,
        kind: GatewayKind,
    ) -> CoreResult<PaymentInitiation> {
        let booking = self.owned_booking(booking_id, user_id).await?;

        if booking.paid {
            return Err(CoreError::InvalidState(
                "booking is already paid".to_string(),
            ));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(CoreError::InvalidState(
                "a cancelled booking cannot be paid".to_string(),
            ));
        }

        let request = PaymentRequest {
            order_ref: new_order_ref(booking.id),
            amount: booking.price,
            order_info: order_info(&booking),
        };
        self.gateway(kind)
            .create_payment(&request)
            .await
            .map_err(map_gateway_error)
    }

    /// Reconcile a gateway callback against the booking it references.
    /// Business failures come back as an outcome, not an error; only a
    /// payload that is not a callback at all errors out.
    pub async fn handle_callback(
        &self,
        kind: GatewayKind,
        params: &HashMap<String, String>,
    ) -> CoreResult<CallbackOutcome> {
        let verdict = self
            .gateway(kind)
            .parse_callback(params)
            .map_err(map_gateway_error)?;

        if !verdict.signature_valid {
            warn!(
                gateway = kind.as_str(),
                order_ref = %verdict.order_ref,
                "callback signature mismatch"
            );
            if self.enforce_signatures {
                return Ok(CallbackOutcome::failure(None, "invalid signature"));
            }
        }

        let booking_id = match parse_booking_id(&verdict.order_ref) {
            Some(id) => id,
            None => {
                warn!(
                    gateway = kind.as_str(),
                    order_ref = %verdict.order_ref,
                    "unrecognized order reference"
                );
                return Ok(CallbackOutcome::failure(
                    None,
                    "unrecognized order reference",
                ));
            }
        };

        let mut booking = match self
            .bookings
            .get_booking(booking_id)
            .await
            .map_err(CoreError::storage)?
        {
            Some(booking) => booking,
            None => {
                return Ok(CallbackOutcome::failure(
                    Some(booking_id),
                    "booking not found",
                ));
            }
        };

        if verdict.amount != booking.price {
            warn!(
                booking_id = %booking.id,
                reported = %verdict.amount,
                expected = %booking.price,
                "callback amount mismatch, booking left unpaid"
            );
            return Ok(CallbackOutcome::failure(
                Some(booking_id),
                "payment amount does not match the booking price",
            ));
        }

        if !verdict.success {
            return Ok(CallbackOutcome::failure(Some(booking_id), verdict.message));
        }

        if booking.paid {
            // Gateways retry callbacks; paid is terminal.
            return Ok(CallbackOutcome::paid(booking_id, "payment already recorded"));
        }

        booking.paid = true;
        self.bookings
            .update_booking(&booking)
            .await
            .map_err(CoreError::storage)?;
        info!(
            booking_id = %booking.id,
            gateway = kind.as_str(),
            code = %verdict.code,
            "booking marked paid"
        );
        Ok(CallbackOutcome::paid(booking_id, "payment successful"))
    }

    pub async fn get_payment_status(
        &self,
        booking_id: Uuid,
        user_id: &str,
    ) -> CoreResult<PaymentStatusView> {
        let booking = self.owned_booking(booking_id, user_id).await?;
        Ok(PaymentStatusView {
            booking_id: booking.id,
            paid: booking.paid,
            status: booking.status,
            price: booking.price,
        })
    }

    pub async fn get_payment(&self, booking_id: Uuid, user_id: &str) -> CoreResult<PaymentSheet> {
        let booking = self.owned_booking(booking_id, user_id).await?;
        Ok(PaymentSheet {
            booking_id: booking.id,
            price: booking.price,
            paid: booking.paid,
            status: booking.status,
            order_info: order_info(&booking),
        })
    }

    /// Ownership misses fold into not found so payment endpoints cannot be
    /// used to probe for booking ids.
    async fn owned_booking(&self, booking_id: Uuid, user_id: &str) -> CoreResult<Booking> {
        self.bookings
            .find_for_user(booking_id, user_id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))
    }

    fn gateway(&self, kind: GatewayKind) -> &dyn PaymentGateway {
        match kind {
            GatewayKind::Wallet => self.wallet.as_ref(),
            GatewayKind::Bank => self.bank.as_ref(),
        }
    }
}

/// `{booking}_{timestamp}_{nonce}`: unique per attempt so a retried
/// payment never collides with an earlier one at the gateway.
pub fn new_order_ref(booking_id: Uuid) -> String {
    format!(
        "{}_{}_{}",
        booking_id,
        Utc::now().timestamp(),
        rand::random::<u32>()
    )
}

/// The booking id is the reference's first `_`-separated field.
pub fn parse_booking_id(order_ref: &str) -> Option<Uuid> {
    order_ref
        .split('_')
        .next()
        .and_then(|head| Uuid::parse_str(head).ok())
}

/// Flatten a JSON callback body into the string map the adapters verify.
/// Gateways send flat payloads; anything nested is dropped.
pub fn params_from_json(body: &Value) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if let Some(object) = body.as_object() {
        for (key, value) in object {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            params.insert(key.clone(), rendered);
        }
    }
    params
}

fn order_info(booking: &Booking) -> String {
    format!("Tour booking {}", booking.id)
}

fn map_gateway_error(err: GatewayError) -> CoreError {
    match err {
        GatewayError::Transport(msg) => CoreError::GatewayUnavailable(msg),
        GatewayError::Rejected(msg) => CoreError::GatewayUnavailable(msg),
        GatewayError::MalformedCallback(msg) => CoreError::InvalidInput(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{BankConfig, BankGateway};
    use crate::signature::{sign_sha256, sign_sha512, sorted_encoded_pairs, sorted_pairs};
    use crate::wallet::{SandboxTransport, WalletConfig, WalletGateway};
    use chrono::NaiveDate;
    use wayfare_store::MemoryStore;

    const WALLET_SECRET: &str = "wallet-secret";
    const WALLET_ACCESS: &str = "access";
    const BANK_SECRET: &str = "bank-secret";

    fn service(store: Arc<MemoryStore>, enforce_signatures: bool) -> PaymentService {
        let wallet = WalletGateway::new(
            WalletConfig {
                partner_code: "WAYFARE".to_string(),
                access_key: WALLET_ACCESS.to_string(),
                secret_key: WALLET_SECRET.to_string(),
                endpoint: "https://sandbox.wallet.test/create".to_string(),
                redirect_url: "https://api.test/v1/payments/wallet/return".to_string(),
                ipn_url: "https://api.test/v1/payments/wallet/notify".to_string(),
            },
            Arc::new(SandboxTransport),
        );
        let bank = BankGateway::new(BankConfig {
            tmn_code: "WAYFARE01".to_string(),
            secret_key: BANK_SECRET.to_string(),
            pay_url: "https://sandbox.bank.test/paygate".to_string(),
            return_url: "https://api.test/v1/payments/bank/return".to_string(),
        });
        PaymentService::new(store, Arc::new(wallet), Arc::new(bank), enforce_signatures)
    }

    async fn seed_booking(store: &MemoryStore, price: Decimal) -> Booking {
        let booking = Booking::new(
            Uuid::new_v4(),
            "user-1".to_string(),
            NaiveDate::from_ymd_opt(2027, 6, 1).unwrap(),
            2,
            price,
        );
        store.insert_booking(&booking).await.unwrap();
        booking
    }

    fn wallet_callback(order_ref: &str, amount: &str, code: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("partnerCode".to_string(), "WAYFARE".to_string());
        params.insert("orderId".to_string(), order_ref.to_string());
        params.insert("amount".to_string(), amount.to_string());
        params.insert("resultCode".to_string(), code.to_string());
        params.insert("transId".to_string(), "42".to_string());
        params.insert("message".to_string(), "ok".to_string());

        let mut signed = params.clone();
        signed.insert("accessKey".to_string(), WALLET_ACCESS.to_string());
        let signature =
            sign_sha256(WALLET_SECRET, &sorted_pairs(&signed, "signature")).unwrap();
        params.insert("signature".to_string(), signature);
        params
    }

    fn bank_callback(order_ref: &str, amount_minor: &str, code: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();
        params.insert("tmnCode".to_string(), "WAYFARE01".to_string());
        params.insert("txnRef".to_string(), order_ref.to_string());
        params.insert("amount".to_string(), amount_minor.to_string());
        params.insert("responseCode".to_string(), code.to_string());
        let signature =
            sign_sha512(BANK_SECRET, &sorted_encoded_pairs(&params, "secureHash")).unwrap();
        params.insert("secureHash".to_string(), signature);
        params
    }

    #[test]
    fn test_order_ref_round_trip() {
        let booking_id = Uuid::new_v4();
        let order_ref = new_order_ref(booking_id);
        assert_eq!(parse_booking_id(&order_ref), Some(booking_id));
        assert_eq!(parse_booking_id("garbage_1_2"), None);
        assert_eq!(parse_booking_id(""), None);
    }

    #[tokio::test]
    async fn test_wallet_payment_happy_path() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;

        let initiation = service
            .initiate_payment(booking.id, "user-1", GatewayKind::Wallet)
            .await
            .unwrap();
        assert!(initiation.pay_url.contains(&booking.id.to_string()));
        assert_eq!(parse_booking_id(&initiation.order_ref), Some(booking.id));

        let params = wallet_callback(&initiation.order_ref, "2000000", "0");
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.booking_id, Some(booking.id));

        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(stored.paid);
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;

        let initiation = service
            .initiate_payment(booking.id, "user-1", GatewayKind::Wallet)
            .await
            .unwrap();
        let params = wallet_callback(&initiation.order_ref, "2000000", "0");

        let first = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        let second = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(first.success);
        assert!(second.success);
        assert_eq!(second.message, "payment already recorded");
    }

    #[tokio::test]
    async fn test_amount_mismatch_never_pays() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;
        let order_ref = new_order_ref(booking.id);

        // Callback reports the extension-inclusive total instead of the
        // booking price.
        let params = wallet_callback(&order_ref, "2333333.33", "0");
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            outcome.message,
            "payment amount does not match the booking price"
        );
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(!stored.paid);
    }

    #[tokio::test]
    async fn test_failure_code_leaves_booking_unpaid() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;
        let order_ref = new_order_ref(booking.id);

        let params = wallet_callback(&order_ref, "2000000", "1006");
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "payment declined by the payer");
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(!stored.paid);
    }

    #[tokio::test]
    async fn test_unrecognized_reference_is_soft_failure() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        seed_booking(&store, Decimal::from(2_000_000)).await;

        let params = wallet_callback("not-a-uuid_1_2", "2000000", "0");
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "unrecognized order reference");
    }

    #[tokio::test]
    async fn test_tampered_signature_still_pays_in_permissive_mode() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;
        let order_ref = new_order_ref(booking.id);

        let mut params = wallet_callback(&order_ref, "2000000", "0");
        params.insert("signature".to_string(), "deadbeef".to_string());
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(outcome.success);
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(stored.paid);
    }

    #[tokio::test]
    async fn test_tampered_signature_fails_in_enforcing_mode() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), true);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;
        let order_ref = new_order_ref(booking.id);

        let mut params = wallet_callback(&order_ref, "2000000", "0");
        params.insert("signature".to_string(), "deadbeef".to_string());
        let outcome = service
            .handle_callback(GatewayKind::Wallet, &params)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "invalid signature");
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(!stored.paid);
    }

    #[tokio::test]
    async fn test_bank_callback_pays_with_minor_units() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(2_000_000)).await;

        let initiation = service
            .initiate_payment(booking.id, "user-1", GatewayKind::Bank)
            .await
            .unwrap();
        let params = bank_callback(&initiation.order_ref, "200000000", "00");
        let outcome = service
            .handle_callback(GatewayKind::Bank, &params)
            .await
            .unwrap();
        assert!(outcome.success);
        let stored = store.get_booking(booking.id).await.unwrap().unwrap();
        assert!(stored.paid);
    }

    #[tokio::test]
    async fn test_initiate_rejects_paid_and_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);

        let mut paid = seed_booking(&store, Decimal::from(100)).await;
        paid.paid = true;
        store.update_booking(&paid).await.unwrap();
        let err = service
            .initiate_payment(paid.id, "user-1", GatewayKind::Wallet)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));

        let mut cancelled = seed_booking(&store, Decimal::from(100)).await;
        cancelled.status = BookingStatus::Cancelled;
        store.update_booking(&cancelled).await.unwrap();
        let err = service
            .initiate_payment(cancelled.id, "user-1", GatewayKind::Bank)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_initiate_folds_foreign_booking_to_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone(), false);
        let booking = seed_booking(&store, Decimal::from(100)).await;

        let err = service
            .initiate_payment(booking.id, "someone-else", GatewayKind::Wallet)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn test_params_from_json_flattens_scalars() {
        let body = serde_json::json!({
            "orderId": "abc",
            "amount": 2000000,
            "resultCode": 0,
            "nested": {"dropped": true},
        });
        let params = params_from_json(&body);
        assert_eq!(params.get("orderId").unwrap(), "abc");
        assert_eq!(params.get("amount").unwrap(), "2000000");
        assert_eq!(params.get("resultCode").unwrap(), "0");
        assert!(!params.contains_key("nested"));
    }
}
