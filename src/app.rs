use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/setup", get(handlers::setup))
        .route("/pay", post(handlers::pay_form))
        .route("/last-payment", post(handlers::last_payment_form))
        .route("/just-paid", post(handlers::just_paid_form))
        .route("/reset", post(handlers::reset_form))
        .route(
            "/api/configuration",
            get(handlers::get_configuration)
                .put(handlers::put_configuration)
                .delete(handlers::delete_configuration),
        )
        .route("/api/schedule", get(handlers::get_schedule))
        .route("/api/payments", post(handlers::post_payment))
        .route("/api/last-payment", put(handlers::put_last_payment))
        .route("/api/last-payment/now", post(handlers::just_paid))
        .with_state(state)
}
