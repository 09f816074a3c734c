use serde::Deserialize;
use std::env;
use wayfare_shared::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub frontend: FrontendConfig,
    pub payment: PaymentConfig,
    pub wallet_gateway: WalletGatewayConfig,
    pub bank_gateway: BankGatewayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    pub jwt_expiration_seconds: u64,
}

/// Client app the payment return redirects land on.
#[derive(Debug, Deserialize, Clone)]
pub struct FrontendConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Permissive by default: a bad callback signature is logged but the
    /// callback is still processed. Flip on to hard-fail mismatches.
    #[serde(default)]
    pub enforce_signatures: bool,
    #[serde(default = "default_gateway_timeout_ms")]
    pub gateway_timeout_ms: u64,
}

fn default_gateway_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletGatewayConfig {
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: Masked<String>,
    pub endpoint: String,
    pub redirect_url: String,
    pub ipn_url: String,
    /// Skip the outbound create call and fabricate pay urls locally.
    #[serde(default)]
    pub sandbox: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BankGatewayConfig {
    pub tmn_code: String,
    pub secret_key: Masked<String>,
    pub pay_url: String,
    pub return_url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of WAYFARE)
            // Eg. `WAYFARE_SERVER__PORT=9000` would set `server.port`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
