use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod extensions;
pub mod middleware;
pub mod payments;
pub mod reviews;
pub mod state;
pub mod tours;

pub use state::AppState;

/// Build the full router. Three route groups: public reads and gateway
/// callbacks, customer endpoints behind token auth, admin endpoints
/// behind the admin role check.
pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let public = Router::new()
        .merge(tours::public_routes())
        .merge(reviews::public_routes())
        .merge(payments::callback_routes());

    let customer = Router::new()
        .merge(bookings::customer_routes())
        .merge(extensions::customer_routes())
        .merge(reviews::customer_routes())
        .merge(payments::customer_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::customer_auth_middleware,
        ));

    let admin = Router::new()
        .merge(tours::admin_routes())
        .merge(bookings::admin_routes())
        .merge(extensions::admin_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(customer)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
