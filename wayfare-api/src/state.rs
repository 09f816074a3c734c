use std::sync::Arc;
use wayfare_booking::{BookingEngine, ExtensionWorkflow};
use wayfare_catalog::{CatalogService, ReviewService};
use wayfare_payment::PaymentService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
    pub bookings: Arc<BookingEngine>,
    pub extensions: Arc<ExtensionWorkflow>,
    pub payments: Arc<PaymentService>,
    /// Client app the unauthenticated payment-return redirects land on.
    pub frontend_base_url: String,
    pub auth: AuthConfig,
}
