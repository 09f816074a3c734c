pub mod bank;
pub mod service;
pub mod signature;
pub mod wallet;

pub use bank::{BankConfig, BankGateway};
pub use service::{
    params_from_json, parse_booking_id, CallbackOutcome, PaymentService, PaymentSheet,
    PaymentStatusView,
};
pub use wallet::{HttpWalletTransport, SandboxTransport, WalletConfig, WalletGateway};
