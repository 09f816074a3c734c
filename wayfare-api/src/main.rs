use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{
    app,
    state::{AppState, AuthConfig},
};
use wayfare_booking::{BookingEngine, ExtensionWorkflow};
use wayfare_catalog::{CatalogService, ReviewService};
use wayfare_core::payment::PaymentGateway;
use wayfare_payment::{
    BankConfig, BankGateway, HttpWalletTransport, PaymentService, SandboxTransport, WalletConfig,
    WalletGateway,
};
use wayfare_store::{Config, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load config")?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let store = Arc::new(MemoryStore::new());

    let wallet_config = WalletConfig {
        partner_code: config.wallet_gateway.partner_code.clone(),
        access_key: config.wallet_gateway.access_key.clone(),
        secret_key: config.wallet_gateway.secret_key.as_str().to_string(),
        endpoint: config.wallet_gateway.endpoint.clone(),
        redirect_url: config.wallet_gateway.redirect_url.clone(),
        ipn_url: config.wallet_gateway.ipn_url.clone(),
    };
    let wallet: Arc<dyn PaymentGateway> = if config.wallet_gateway.sandbox {
        tracing::info!("wallet gateway running in sandbox mode");
        Arc::new(WalletGateway::new(wallet_config, Arc::new(SandboxTransport)))
    } else {
        let transport =
            HttpWalletTransport::new(Duration::from_millis(config.payment.gateway_timeout_ms))
                .context("failed to build wallet transport")?;
        Arc::new(WalletGateway::new(wallet_config, Arc::new(transport)))
    };
    let bank: Arc<dyn PaymentGateway> = Arc::new(BankGateway::new(BankConfig {
        tmn_code: config.bank_gateway.tmn_code.clone(),
        secret_key: config.bank_gateway.secret_key.as_str().to_string(),
        pay_url: config.bank_gateway.pay_url.clone(),
        return_url: config.bank_gateway.return_url.clone(),
    }));

    let app_state = AppState {
        catalog: Arc::new(CatalogService::new(store.clone(), store.clone())),
        reviews: Arc::new(ReviewService::new(store.clone(), store.clone())),
        bookings: Arc::new(BookingEngine::new(store.clone(), store.clone())),
        extensions: Arc::new(ExtensionWorkflow::new(
            store.clone(),
            store.clone(),
            store.clone(),
        )),
        payments: Arc::new(PaymentService::new(
            store.clone(),
            wallet,
            bank,
            config.payment.enforce_signatures,
        )),
        frontend_base_url: config.frontend.base_url.clone(),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.as_str().to_string(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind listener")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
