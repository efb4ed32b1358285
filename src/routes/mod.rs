use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login, token refresh, password recovery.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route(
            "/auth/refresh",
            routing::post(handlers::auth::refresh_token),
        )
        .route(
            "/auth/forgot-password",
            routing::post(handlers::auth::forgot_password),
        )
        .route(
            "/auth/reset-password",
            routing::post(handlers::auth::reset_password),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes: the unauthenticated homestay catalog.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/homestay/list-all",
            routing::get(handlers::homestay::list_all_homestays),
        )
        .route(
            "/homestay/search",
            routing::get(handlers::homestay::search_homestays),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: everything behind the JWT middleware.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Bookings
        .route(
            "/bookings",
            routing::post(handlers::booking::create_booking)
                .get(handlers::booking::list_bookings),
        )
        .route(
            "/bookings/verify-booking/{id}",
            routing::patch(handlers::booking::verify_booking),
        )
        .route(
            "/bookings/{id}/cancel",
            routing::patch(handlers::booking::cancel_booking),
        )
        .route(
            "/bookings/{id}",
            routing::get(handlers::booking::get_booking)
                .patch(handlers::booking::update_booking)
                .delete(handlers::booking::delete_booking),
        )
        // Homestays (listing management - roles checked in handlers)
        .route(
            "/homestay",
            routing::post(handlers::homestay::create_homestay)
                .get(handlers::homestay::list_my_homestays),
        )
        .route(
            "/homestay/{id}",
            routing::get(handlers::homestay::get_homestay)
                .patch(handlers::homestay::update_homestay)
                .delete(handlers::homestay::delete_homestay),
        )
        // Users
        .route(
            "/user",
            routing::post(handlers::user::create_user).get(handlers::user::list_users),
        )
        .route(
            "/user/{id}",
            routing::get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
