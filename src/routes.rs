use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    response::Response,
    routing::{delete, get, patch, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api;
use crate::config::Config;

async fn health_check() -> &'static str {
    "OK"
}

fn member_routes() -> Router {
    Router::new()
        .route(
            "/profile",
            get(api::profile::get_profile)
                .post(api::profile::create_profile)
                .patch(api::profile::update_profile),
        )
        .route(
            "/households",
            get(api::household::list_households).post(api::household::create_household),
        )
        .route("/households/join", post(api::household::join_household))
        .route("/households/:id/membership", delete(api::household::leave_household))
        .route("/households/:id/members", get(api::household::list_members))
        .route(
            "/households/:id/pets",
            get(api::pet::list_pets).post(api::pet::create_pet),
        )
        .route(
            "/pets/:id",
            patch(api::pet::update_pet).delete(api::pet::delete_pet),
        )
        .route("/pets/:id/owners", post(api::pet::add_owner))
        .route("/pets/:id/care", post(api::care::log_care))
        .route("/care/:id", delete(api::care::delete_care))
        .route("/feed", get(api::post::feed))
        .route("/posts", post(api::post::create_post))
        .route("/posts/:id", delete(api::post::delete_post))
        .route("/posts/:id/like", post(api::post::toggle_like))
        .route(
            "/households/:id/wishlist",
            get(api::wishlist::list_items).post(api::wishlist::create_item),
        )
        .route(
            "/wishlist/:id",
            patch(api::wishlist::toggle_item).delete(api::wishlist::delete_item),
        )
        .route(
            "/households/:id/reminders",
            get(api::reminder::list_reminders).post(api::reminder::create_reminder),
        )
        .route("/households/:id/pokes", post(api::reminder::poke))
        .route("/reminders/:id/read", post(api::reminder::mark_read))
        .route("/reminders/:id", delete(api::reminder::delete_reminder))
        .route(
            "/households/:id/coupons",
            get(api::coupon::list_coupons).post(api::coupon::issue_coupon),
        )
        .route("/coupons/:id/redeem", post(api::coupon::redeem_coupon))
        .route("/coupons/:id/void", post(api::coupon::void_coupon))
        .route(
            "/households/:id/countdowns",
            get(api::countdown::list_countdowns).post(api::countdown::create_countdown),
        )
        .route("/countdowns/:id", delete(api::countdown::delete_countdown))
        .route("/households/:id/stats", get(api::stats::household_stats))
        .route("/households/:id/graph", get(api::stats::interaction_graph))
        .route("/households/:id/honors", get(api::stats::honor_history))
        .route("/updates/latest", get(api::updates::latest_update))
}

fn admin_routes() -> Router {
    Router::new()
        .route("/admin/dashboard", get(api::admin::dashboard))
        .route("/admin/households", post(api::admin::create_household))
        .route("/admin/households/:id", delete(api::admin::delete_household))
        .route(
            "/admin/households/:id/members/:user_id",
            delete(api::admin::remove_member),
        )
        .route("/admin/profiles/:id", delete(api::admin::delete_profile))
        .route("/admin/pets/:id", delete(api::admin::delete_pet))
        .route("/admin/updates", post(api::admin::publish_update))
        .route("/admin/updates/:id/toggle", post(api::admin::toggle_update))
        .route("/admin/updates/:id", delete(api::admin::delete_update))
        .route_layer(from_fn(api::middleware::admin_middleware))
}

fn cors(origin: &str) -> CorsLayer {
    let origin = origin.parse::<HeaderValue>().unwrap_or_else(|e| {
        tracing::warn!("Invalid CORS_ORIGIN {origin:?}: {e}, using http://localhost:3003");
        HeaderValue::from_static("http://localhost:3003")
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn request_span(request: &Request) -> tracing::Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str());

    // "METHOD /route/:id" keeps span names low-cardinality
    let span_name = format!(
        "{} {}",
        request.method(),
        matched_path.unwrap_or_else(|| request.uri().path())
    );

    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .or_else(|| request.headers().get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        "otel.name" = span_name,
        client_ip = client_ip,
        method = ?request.method(),
        uri = ?request.uri(),
        table = tracing::field::Empty,
        action = tracing::field::Empty,
        member_id = tracing::field::Empty,
        household_id = tracing::field::Empty,
        pet_id = tracing::field::Empty,
        business_event = tracing::field::Empty,
        error = tracing::field::Empty,
        status = tracing::field::Empty,
        latency = tracing::field::Empty,
    )
}

/// The HTTP surface without the metrics layer, which is process-global and
/// installed by the binary.
pub fn app(db: DatabaseConnection, config: Arc<Config>) -> Router {
    let protected = member_routes()
        .merge(admin_routes())
        .route_layer(from_fn(api::middleware::auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(Extension(db))
        .layer(Extension(config.clone()))
        .layer(CookieManagerLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(())
                .on_response(|response: &Response, latency: std::time::Duration, span: &tracing::Span| {
                    span.record("status", tracing::field::display(response.status()));
                    span.record("latency", tracing::field::debug(latency));
                    tracing::info!("request completed");
                }),
        )
        .layer(cors(&config.cors_origin))
        .layer(DefaultBodyLimit::max(1024 * 1024))
}
