use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post, put};
use brigada_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

use cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/permissions/catalog",
            get(handlers::permissions::list_catalog_handler),
        )
        .route(
            "/api/me/branches/{branch_id}/permissions",
            get(handlers::permissions::my_branch_permissions_handler),
        )
        .route(
            "/api/branches/{branch_id}/users/{user_id}/permissions",
            get(handlers::permissions::user_branch_permissions_handler),
        )
        .route(
            "/api/users/{user_id}/brand-permissions",
            get(handlers::permissions::user_brand_permissions_handler),
        )
        .route(
            "/api/branches/{branch_id}/users/{user_id}/overrides",
            get(handlers::overrides::get_overrides_handler)
                .put(handlers::overrides::save_overrides_handler),
        )
        .route(
            "/api/branches/{branch_id}/users/{user_id}/overrides/preview",
            post(handlers::overrides::preview_overrides_handler),
        )
        .route(
            "/api/branches/{branch_id}/users/{user_id}/overrides/reset",
            post(handlers::overrides::reset_overrides_handler),
        )
        .route(
            "/api/templates",
            get(handlers::templates::list_templates_handler)
                .post(handlers::templates::create_template_handler),
        )
        .route(
            "/api/templates/{template_id}",
            get(handlers::templates::get_template_handler)
                .patch(handlers::templates::update_template_handler),
        )
        .route(
            "/api/templates/{template_id}/permissions",
            put(handlers::templates::save_template_permissions_handler),
        )
        .route(
            "/api/template-bindings",
            get(handlers::templates::list_bindings_handler)
                .put(handlers::templates::bind_template_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_gateway_identity,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
